//! Configuration of a single run.
//!
//! Values are resolved with the following priority (later sources override
//! earlier ones):
//!
//! 1. Built-in defaults
//! 2. The TOML file given by `--config`
//! 3. CLI arguments

use std::path::Path;

use qsd_solver::{solvers::Method, CachePolicy};
use serde::{Deserialize, Serialize};

use crate::error::RunnerError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Target step of the integrator
    pub delta_t: f64,
    /// Total simulated time
    pub duration: f64,
    /// Number of integrator steps between stored samples
    pub downsample: usize,
    /// Seed of the first trajectory, or `None` to seed from the OS
    pub seed: Option<u64>,
    pub ntraj: usize,
    pub method: Method,
    pub cache_policy: CachePolicy,
    /// Number of levels of the damped ladder
    pub dimension: usize,
    pub parallel: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            delta_t: 1e-4,
            duration: 0.5,
            downsample: 1,
            seed: None,
            ntraj: 5,
            method: Method::default(),
            cache_policy: CachePolicy::default(),
            dimension: 8,
            parallel: false,
        }
    }
}

impl RunConfig {
    /// Load the configuration, reading `config_path` over the defaults if given.
    pub fn load(config_path: Option<&Path>) -> Result<Self, RunnerError> {
        let Some(path) = config_path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path).map_err(|source| RunnerError::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, RunnerError> {
        Ok(toml::from_str(content)?)
    }

    pub fn validate(&self) -> Result<(), RunnerError> {
        if !(self.delta_t.is_finite() && self.delta_t > 0.0) {
            return Err(RunnerError::Config(format!(
                "delta_t must be positive; got {}",
                self.delta_t
            )));
        }
        if !(self.duration.is_finite() && self.duration > 0.0) {
            return Err(RunnerError::Config(format!(
                "duration must be positive; got {}",
                self.duration
            )));
        }
        if self.downsample == 0 {
            return Err(RunnerError::Config("downsample must be at least 1".into()));
        }
        if self.dimension < 2 {
            return Err(RunnerError::Config(format!(
                "dimension must be at least 2; got {}",
                self.dimension
            )));
        }
        if self.ntraj == 0 {
            return Err(RunnerError::Config("ntraj must be at least 1".into()));
        }
        Ok(())
    }

    /// The spacing of the stored samples
    pub fn sample_dt(&self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let downsample = self.downsample as f64;
        self.delta_t * downsample
    }

    /// The sample times `0, sample_dt, ...` up to and including `duration`
    pub fn tspan(&self) -> Vec<f64> {
        let sample_dt = self.sample_dt();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let n_samples = (self.duration / sample_dt * (1.0 + 1e-12)).floor() as usize + 1;
        (0..n_samples)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let i = i as f64;
                i * sample_dt
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use qsd_solver::{solvers::Method, CachePolicy};

    use super::RunConfig;
    use crate::error::RunnerError;

    #[test]
    fn test_default_is_valid() {
        let config = RunConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(RunConfig::load(None).unwrap(), config);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = RunConfig::from_toml(
            r#"
            delta_t = 0.001
            seed = 4
            method = "milsten"
            cache_policy = "time"
            "#,
        )
        .unwrap();

        assert!((config.delta_t - 0.001).abs() < f64::EPSILON);
        assert_eq!(config.seed, Some(4));
        assert_eq!(config.method, Method::Milsten);
        assert_eq!(config.cache_policy, CachePolicy::Time);
        assert_eq!(config.dimension, RunConfig::default().dimension);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(matches!(
            RunConfig::from_toml("output_dir = \"/data\""),
            Err(RunnerError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_is_reported() {
        let result = RunConfig::load(Some(std::path::Path::new("/nonexistent/qsd.toml")));
        assert!(matches!(result, Err(RunnerError::Io { .. })));
    }

    #[test]
    fn test_invalid_values() {
        for config in [
            RunConfig {
                delta_t: 0.0,
                ..RunConfig::default()
            },
            RunConfig {
                duration: f64::NAN,
                ..RunConfig::default()
            },
            RunConfig {
                downsample: 0,
                ..RunConfig::default()
            },
            RunConfig {
                dimension: 1,
                ..RunConfig::default()
            },
        ] {
            assert!(matches!(config.validate(), Err(RunnerError::Config(_))));
        }
    }

    #[test]
    fn test_tspan_covers_duration() {
        let config = RunConfig {
            delta_t: 1e-4,
            duration: 0.5,
            downsample: 1,
            ..RunConfig::default()
        };
        let tspan = config.tspan();
        assert_eq!(tspan.len(), 5001);
        assert!((tspan[5000] - 0.5).abs() < 1e-12);

        let coarse = RunConfig {
            downsample: 1000,
            ..config
        };
        let tspan = coarse.tspan();
        assert_eq!(tspan.len(), 6);
        assert!((tspan[5] - 0.5).abs() < 1e-12);
    }
}
