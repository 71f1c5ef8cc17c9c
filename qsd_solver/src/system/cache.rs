use ndarray::Array1;
use num_complex::Complex;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::coupling::{Coupling, CouplingPart};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum CachePolicy {
    /// Serve any evaluation at the cached time from the cache, whatever its state.
    /// Only correct for a solver that evaluates a single state per time, such as
    /// [`EulerStepper`][crate::solvers::EulerStepper].
    Time,
    /// Also compare the state by value, and recompute on mismatch
    #[default]
    TimeAndState,
}

/// Memoizes `L_i |\psi>` and `<L_i>` for one trajectory.
///
/// The cached time starts (and is reset to) `NaN`, so the first evaluation
/// of a trajectory always misses.
#[derive(Clone, Debug)]
pub struct OperatorCache {
    policy: CachePolicy,
    t: f64,
    state: Option<Array1<Complex<f64>>>,
    parts: Vec<CouplingPart>,
    n_evaluations: usize,
}

impl OperatorCache {
    #[must_use]
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            policy,
            t: f64::NAN,
            state: None,
            parts: Vec::new(),
            n_evaluations: 0,
        }
    }

    /// Invalidate the cache, ready for a new trajectory
    pub fn reset(&mut self) {
        self.t = f64::NAN;
        self.state = None;
        self.parts.clear();
        self.n_evaluations = 0;
    }

    #[must_use]
    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// The number of times the parts have been recomputed since the last reset
    #[must_use]
    pub fn n_evaluations(&self) -> usize {
        self.n_evaluations
    }

    /// Whether an evaluation at `(state, t)` would be served from the cache
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_current(&self, state: &Array1<Complex<f64>>, t: f64) -> bool {
        if t != self.t {
            return false;
        }
        match self.policy {
            CachePolicy::Time => true,
            CachePolicy::TimeAndState => self.state.as_ref() == Some(state),
        }
    }

    /// Recompute `L_i |\psi>` and `<L_i>` unless they are already current for `(state, t)`
    pub fn ensure_current<N: Coupling>(
        &mut self,
        coupling: &N,
        state: &Array1<Complex<f64>>,
        t: f64,
    ) -> &[CouplingPart] {
        if !self.is_current(state, t) {
            self.parts = coupling.get_parts(state);
            self.t = t;
            if self.policy == CachePolicy::TimeAndState {
                self.state = Some(state.to_owned());
            }
            self.n_evaluations += 1;
        }
        &self.parts
    }
}
