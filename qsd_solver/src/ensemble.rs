use std::{num::NonZeroUsize, thread};

use ndarray::{s, Array1, Array2, Array3, Axis};
use ndarray_linalg::Norm;
use num_complex::Complex;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, info, instrument};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    error::{QSDError, SolverError},
    measurement::expectation_values,
    solvers::Solver,
    sparse::Tensor,
    system::{
        cache::CachePolicy,
        coupling::{Coupling, CouplingOperators},
        qsd::QSDSystem,
        validate::validate_observables,
    },
};

/// The output of [`EnsembleSolver::solve`]
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QSDResult {
    /// The state of every trajectory, with shape `[n_trajectories, n_times, N]`
    pub states: Array3<Complex<f64>>,
    /// The expectation of every observable, with shape
    /// `[n_trajectories, n_times, n_observables]`, if observables were requested
    pub expectations: Option<Array3<Complex<f64>>>,
}

impl QSDResult {
    #[must_use]
    pub fn n_trajectories(&self) -> usize {
        self.states.len_of(Axis(0))
    }

    /// The norm of every state, with shape `[n_trajectories, n_times]`
    #[must_use]
    pub fn norms(&self) -> Array2<f64> {
        self.states.map_axis(Axis(2), |state| state.norm_l2())
    }
}

/// Runs `n_trajectories` independent integrations of a [`QSDSystem`].
///
/// Every trajectory owns its cache and its random number generator, so the
/// parallel mode produces the same ensemble as the sequential mode for a given seed.
pub struct EnsembleSolver<S> {
    pub solver: S,
    pub n_trajectories: usize,
    /// Only the normalized QSD equations are supported
    pub normalized: bool,
    /// Seeds a master [`StdRng`], from which the seed of every trajectory is
    /// drawn in order. Ensembles with different seeds share no trajectory seeds.
    /// If `None` every trajectory is seeded from the operating system.
    pub seed: Option<u64>,
    pub cache_policy: CachePolicy,
    /// Run the trajectories on scoped threads, at most
    /// [`thread::available_parallelism`] at a time
    pub parallel: bool,
}

impl<S> EnsembleSolver<S> {
    #[must_use]
    pub fn new(solver: S, n_trajectories: usize) -> Self {
        Self {
            solver,
            n_trajectories,
            normalized: true,
            seed: None,
            cache_policy: CachePolicy::default(),
            parallel: false,
        }
    }

    fn rngs(&self) -> Vec<StdRng> {
        match self.seed {
            Some(seed) => {
                let mut master = StdRng::seed_from_u64(seed);
                (0..self.n_trajectories)
                    .map(|_| StdRng::seed_from_u64(master.gen()))
                    .collect()
            }
            None => (0..self.n_trajectories)
                .map(|_| StdRng::from_entropy())
                .collect(),
        }
    }
}

impl<S: Solver + Sync> EnsembleSolver<S> {
    fn solve_trajectory<H: Tensor, N: Coupling>(
        &self,
        system: &QSDSystem<H, N>,
        initial_state: &Array1<Complex<f64>>,
        tspan: &[f64],
        index: usize,
        mut rng: StdRng,
    ) -> Result<Array2<Complex<f64>>, SolverError> {
        let mut trajectory = system.trajectory(self.cache_policy);

        let states = self
            .solver
            .integrate(initial_state, &mut trajectory, tspan, &mut rng)?;
        debug!(
            index,
            n_evaluations = trajectory.cache().n_evaluations(),
            "trajectory complete"
        );
        Ok(states)
    }

    fn solve_trajectories<H, N>(
        &self,
        system: &QSDSystem<H, N>,
        initial_state: &Array1<Complex<f64>>,
        tspan: &[f64],
    ) -> Result<Vec<Array2<Complex<f64>>>, SolverError>
    where
        H: Tensor + Sync,
        N: Coupling + Sync,
    {
        let rngs = self.rngs();
        if !self.parallel {
            return rngs
                .into_iter()
                .enumerate()
                .map(|(index, rng)| self.solve_trajectory(system, initial_state, tspan, index, rng))
                .collect();
        }

        let n_threads = thread::available_parallelism().map_or(1, NonZeroUsize::get);
        let mut rngs = rngs.into_iter().enumerate().peekable();
        let mut out = Vec::with_capacity(self.n_trajectories);
        while rngs.peek().is_some() {
            let chunk = rngs.by_ref().take(n_threads).collect::<Vec<_>>();
            let states = thread::scope(|s| {
                let threads = chunk
                    .into_iter()
                    .map(|(index, rng)| {
                        s.spawn(move || {
                            self.solve_trajectory(system, initial_state, tspan, index, rng)
                        })
                    })
                    .collect::<Vec<_>>();

                threads
                    .into_iter()
                    .map(|t| t.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                    .collect::<Result<Vec<_>, _>>()
            })?;
            out.extend(states);
        }
        Ok(out)
    }

    /// Integrate `n_trajectories` trajectories of `system` from `initial_state`
    /// (an `N x 1` column), sampling each at every time in `tspan`.
    ///
    /// If `observables` are given, the expectation of each is evaluated for
    /// every sampled state.
    ///
    /// # Errors
    ///
    /// - [`QSDError::NotImplemented`] if `normalized` is false, before any other check.
    /// - [`QSDError::Dimension`] if any operand disagrees with the initial state.
    /// - [`QSDError::Solver`] if any trajectory fails to integrate.
    #[instrument(
        skip_all,
        fields(n_trajectories = self.n_trajectories, n_times = tspan.len(), parallel = self.parallel)
    )]
    pub fn solve<H, N, O>(
        &self,
        system: &QSDSystem<H, N>,
        initial_state: &Array2<Complex<f64>>,
        tspan: &[f64],
        observables: Option<&[O]>,
    ) -> Result<QSDResult, QSDError>
    where
        H: Tensor + Sync,
        N: Coupling + Sync,
        O: Tensor,
    {
        if !self.normalized {
            return Err(QSDError::NotImplemented("the non-normalized QSD equations"));
        }

        let n_states = system.validate(initial_state)?;
        if let Some(observables) = observables {
            validate_observables(observables, n_states)?;
        }
        info!(
            n_states,
            n_operators = system.coupling.len(),
            cache_policy = ?self.cache_policy,
            "solving QSD ensemble"
        );

        let initial_state = initial_state.column(0).to_owned();
        let trajectories = self.solve_trajectories(system, &initial_state, tspan)?;

        let mut states = Array3::zeros([self.n_trajectories, tspan.len(), n_states]);
        for (i, trajectory) in trajectories.iter().enumerate() {
            states.slice_mut(s![i, .., ..]).assign(trajectory);
        }

        let expectations = observables.map(|o| expectation_values(&states, o));
        info!("ensemble complete");

        Ok(QSDResult {
            states,
            expectations,
        })
    }
}

/// Solve the normalized QSD equations for dense operators.
///
/// Builds a [`QSDSystem`] from `hamiltonian` and `coupling_operators` and runs
/// an [`EnsembleSolver`] with default settings and no seed.
///
/// # Errors
///
/// See [`EnsembleSolver::solve`].
#[allow(clippy::too_many_arguments)]
pub fn qsd_solve<S: Solver + Sync>(
    hamiltonian: &Array2<Complex<f64>>,
    initial_state: &Array2<Complex<f64>>,
    tspan: &[f64],
    coupling_operators: &[Array2<Complex<f64>>],
    solver: S,
    observables: Option<&[Array2<Complex<f64>>]>,
    normalized: bool,
    n_trajectories: usize,
) -> Result<QSDResult, QSDError> {
    let system = QSDSystem {
        hamiltonian: hamiltonian.to_owned(),
        coupling: CouplingOperators::from_operators(coupling_operators),
    };
    EnsembleSolver {
        normalized,
        ..EnsembleSolver::new(solver, n_trajectories)
    }
    .solve(&system, initial_state, tspan, observables)
}
