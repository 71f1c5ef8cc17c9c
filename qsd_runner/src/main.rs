//! Runs an ensemble of QSD trajectories of the damped ladder.
//!
//! # Usage
//!
//! ```bash
//! # Run with the built-in defaults
//! qsd_runner
//!
//! # Override the integration settings
//! qsd_runner --delta-t 1e-4 --duration 0.5 --downsample 10 --seed 3 --ntraj 4
//!
//! # Read settings from a file, then override from the command line
//! qsd_runner --config run.toml --method euler --parallel
//! ```

mod config;
mod error;
mod example;

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use ndarray::s;
use qsd_solver::{
    solvers::{
        EulerStepper, FixedStepSolver, Method, MilstenStepper, Solver, Sri2Stepper,
    },
    CachePolicy, EnsembleSolver, QSDResult,
};
use serde::de::{value::StrDeserializer, DeserializeOwned, IntoDeserializer};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use config::RunConfig;
use error::RunnerError;

/// Parse a library enum by its kebab-case serde name, the spelling used in the TOML file.
///
/// `ValueEnum` cannot be derived here: it would have to be implemented on the
/// library types, and the library does not depend on clap.
fn parse_kebab<T: DeserializeOwned>(value: &str) -> Result<T, String> {
    let deserializer: StrDeserializer<'_, serde::de::value::Error> = value.into_deserializer();
    T::deserialize(deserializer).map_err(|e| e.to_string())
}

/// Quantum State Diffusion trajectories of a damped ladder
#[derive(Parser)]
#[command(name = "qsd_runner")]
#[command(version)]
#[command(about = "Simulate an ensemble of QSD trajectories")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Target step of the integrator
    #[arg(long = "delta-t", alias = "delta_t")]
    delta_t: Option<f64>,

    /// Total simulated time
    #[arg(long)]
    duration: Option<f64>,

    /// Number of integrator steps between stored samples
    #[arg(long)]
    downsample: Option<usize>,

    /// Seed of the first trajectory
    #[arg(long)]
    seed: Option<u64>,

    /// Number of trajectories
    #[arg(long)]
    ntraj: Option<usize>,

    /// Integration method (euler, milsten, sri2)
    #[arg(long, value_parser = parse_kebab::<Method>)]
    method: Option<Method>,

    /// Cache policy (time, time-and-state)
    #[arg(long, value_parser = parse_kebab::<CachePolicy>)]
    cache_policy: Option<CachePolicy>,

    /// Number of levels of the ladder
    #[arg(long)]
    dimension: Option<usize>,

    /// Run the trajectories on parallel threads (`--parallel false` to disable)
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    parallel: Option<bool>,
}

impl Cli {
    fn apply_overrides(&self, config: &mut RunConfig) {
        if let Some(delta_t) = self.delta_t {
            config.delta_t = delta_t;
        }
        if let Some(duration) = self.duration {
            config.duration = duration;
        }
        if let Some(downsample) = self.downsample {
            config.downsample = downsample;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(ntraj) = self.ntraj {
            config.ntraj = ntraj;
        }
        if let Some(method) = self.method {
            config.method = method;
        }
        if let Some(policy) = self.cache_policy {
            config.cache_policy = policy;
        }
        if let Some(dimension) = self.dimension {
            config.dimension = dimension;
        }
        if let Some(parallel) = self.parallel {
            config.parallel = parallel;
        }
    }
}

fn main() {
    let cli = Cli::parse();

    init_logging(&cli.log_level);

    if let Err(e) = run(&cli) {
        error!(error = %e, "run failed");
        std::process::exit(1);
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}

fn run(cli: &Cli) -> Result<(), RunnerError> {
    let mut config = RunConfig::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    info!(?config, "starting run");

    let start = Instant::now();
    let result = match config.method {
        Method::Euler => solve(&config, EulerStepper {}),
        Method::Milsten => solve(&config, MilstenStepper {}),
        Method::Sri2 => solve(&config, Sri2Stepper::default()),
    }?;
    info!(elapsed = ?start.elapsed(), "ensemble solved");

    report(&result);
    Ok(())
}

fn solve<S>(config: &RunConfig, stepper: S) -> Result<QSDResult, RunnerError>
where
    FixedStepSolver<S>: Solver + Sync,
{
    let system = example::system(config.dimension);
    let initial_state = example::initial_state(config.dimension);
    let observables = [example::observable(config.dimension)];

    let solver = EnsembleSolver {
        seed: config.seed,
        cache_policy: config.cache_policy,
        parallel: config.parallel,
        ..EnsembleSolver::new(
            FixedStepSolver {
                stepper,
                target_dt: config.delta_t,
            },
            config.ntraj,
        )
    };
    Ok(solver.solve(&system, &initial_state, &config.tspan(), Some(&observables[..]))?)
}

fn report(result: &QSDResult) {
    let norms = result.norms();
    let last = norms.ncols() - 1;
    for (index, norm) in norms.column(last).iter().enumerate() {
        let state = result.states.slice(s![index, last, ..]);
        info!(index, norm, state = %state, "final state");
    }
    if let Some(expectations) = &result.expectations {
        for (index, values) in expectations.slice(s![.., last, ..]).outer_iter().enumerate() {
            info!(index, expectations = %values, "final expectations");
        }
    }
}

#[cfg(test)]
mod test {
    use clap::Parser;
    use qsd_solver::{solvers::Method, CachePolicy};

    use super::{Cli, RunConfig};

    fn from_toml() -> RunConfig {
        RunConfig::from_toml(
            r#"
            delta_t = 0.001
            seed = 4
            ntraj = 7
            method = "milsten"
            parallel = true
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_cli_overrides_toml() {
        let cli = Cli::try_parse_from(["qsd_runner", "--delta_t", "0.002", "--seed", "9"]).unwrap();
        let mut config = from_toml();
        cli.apply_overrides(&mut config);

        assert!((config.delta_t - 0.002).abs() < f64::EPSILON);
        assert_eq!(config.seed, Some(9));
        // Values not given on the command line keep the TOML value
        assert_eq!(config.ntraj, 7);
        assert_eq!(config.method, Method::Milsten);
        assert!(config.parallel);
    }

    #[test]
    fn test_enum_flags_use_toml_names() {
        let cli = Cli::try_parse_from([
            "qsd_runner",
            "--method",
            "euler",
            "--cache-policy",
            "time-and-state",
        ])
        .unwrap();
        let mut config = RunConfig {
            cache_policy: CachePolicy::Time,
            ..from_toml()
        };
        cli.apply_overrides(&mut config);

        assert_eq!(config.method, Method::Euler);
        assert_eq!(config.cache_policy, CachePolicy::TimeAndState);
        assert!(Cli::try_parse_from(["qsd_runner", "--method", "rk4"]).is_err());
    }

    #[test]
    fn test_parallel_flag() {
        let mut config = from_toml();
        Cli::try_parse_from(["qsd_runner", "--parallel", "false"])
            .unwrap()
            .apply_overrides(&mut config);
        assert!(!config.parallel);

        Cli::try_parse_from(["qsd_runner", "--parallel"])
            .unwrap()
            .apply_overrides(&mut config);
        assert!(config.parallel);

        let mut config = from_toml();
        Cli::try_parse_from(["qsd_runner"])
            .unwrap()
            .apply_overrides(&mut config);
        assert!(config.parallel);
    }
}
