use ndarray::{Array1, Array2};
use num_complex::Complex;
use rand::Rng;

use crate::{error::SolverError, system::SDESystem};

/// A single step of a stochastic integration scheme
pub trait Stepper {
    /// Advance `state` from `t` to `t + dt`, drawing any noise from `rng`
    fn step<T: SDESystem, R: Rng + ?Sized>(
        &self,
        state: &Array1<Complex<f64>>,
        system: &mut T,
        t: f64,
        dt: f64,
        rng: &mut R,
    ) -> Array1<Complex<f64>>;

    fn integrate<T: SDESystem, R: Rng + ?Sized>(
        &self,
        state: &Array1<Complex<f64>>,
        system: &mut T,
        current_t: &mut f64,
        n_step: usize,
        dt: f64,
        rng: &mut R,
    ) -> Array1<Complex<f64>> {
        let mut out = state.clone();
        for _n in 0..n_step {
            out = self.step(&out, system, *current_t, dt, rng);
            *current_t += dt;
        }
        out
    }
}

/// Integrates a SDE system over a time grid.
///
/// Given the drift and diffusion of `system`, the initial state and the grid
/// `tspan`, return the state sampled at every time in the grid as an array of
/// shape `[tspan.len(), initial_state.len()]`. The first row is the initial state.
pub trait Solver {
    /// # Errors
    ///
    /// Returns a [`SolverError`] if the grid is not valid or the state diverges.
    fn integrate<T: SDESystem, R: Rng + ?Sized>(
        &self,
        initial_state: &Array1<Complex<f64>>,
        system: &mut T,
        tspan: &[f64],
        rng: &mut R,
    ) -> Result<Array2<Complex<f64>>, SolverError>;
}

/// Solves a system by taking fixed steps of at most `target_dt` between each time
/// of the grid. Each interval of the grid is split into equal steps, so a
/// non-uniform grid is sampled exactly.
///
/// A `target_dt` of [`f64::INFINITY`] takes a single step per interval.
pub struct FixedStepSolver<S> {
    pub stepper: S,
    pub target_dt: f64,
}

impl<S> FixedStepSolver<S> {
    /// A solver taking a single step between each time of the grid
    pub fn per_sample(stepper: S) -> Self {
        Self {
            stepper,
            target_dt: f64::INFINITY,
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn n_substeps(&self, interval: f64) -> usize {
        ((interval / self.target_dt).ceil() as usize).max(1)
    }
}

/// Check the grid is non-empty and strictly increasing
fn validate_tspan(tspan: &[f64]) -> Result<(), SolverError> {
    if tspan.is_empty() {
        return Err(SolverError::EmptyTimeGrid);
    }
    match tspan.windows(2).position(|w| !(w[1] > w[0])) {
        Some(position) => Err(SolverError::NonIncreasingTimeGrid {
            index: position + 1,
            t: tspan[position + 1],
        }),
        None => Ok(()),
    }
}

impl<S: Stepper> Solver for FixedStepSolver<S> {
    fn integrate<T: SDESystem, R: Rng + ?Sized>(
        &self,
        initial_state: &Array1<Complex<f64>>,
        system: &mut T,
        tspan: &[f64],
        rng: &mut R,
    ) -> Result<Array2<Complex<f64>>, SolverError> {
        // NaN is rejected here too
        if !(self.target_dt > 0f64) {
            return Err(SolverError::InvalidStep { dt: self.target_dt });
        }
        validate_tspan(tspan)?;

        let mut out = Array2::zeros([tspan.len(), initial_state.len()]);
        out.row_mut(0).assign(initial_state);

        let mut current = initial_state.to_owned();
        for (i, window) in tspan.windows(2).enumerate() {
            let interval = window[1] - window[0];
            let n_step = self.n_substeps(interval);
            #[allow(clippy::cast_precision_loss)]
            let dt = interval / n_step as f64;

            let mut current_t = window[0];
            current = self
                .stepper
                .integrate(&current, system, &mut current_t, n_step, dt, rng);

            if current.iter().any(|s| !s.is_finite()) {
                return Err(SolverError::NonFiniteState { t: window[1] });
            }
            out.row_mut(i + 1).assign(&current);
        }

        Ok(out)
    }
}
