use ndarray::{Array1, Array2};
use num_complex::Complex;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{error::DimensionError, sparse::Tensor};

use super::{
    cache::{CachePolicy, OperatorCache},
    coupling::{Coupling, CouplingPart},
    validate::validate_dimensions,
    SDESystem,
};

/// Represents the normalized Quantum State Diffusion SDE System
///
/// ```latex
/// d|\psi> = a(\psi) dt + \sum_j (L_j - <L_j>)|\psi> d\xi_j
/// ```
///
/// The drift term
/// ```latex
/// a(\psi) = -iH|\psi> - \sum_j (\frac{1}{2} L_j^\dagger L_j + \frac{1}{2} <L_j^\dagger><L_j> - <L_j^\dagger> L_j)|\psi>
/// ```
///
/// Each complex noise `d\xi_j = (dW_j + i dW_{m+j}) / \sqrt{2}` is driven by two
/// real Wiener processes, so the diffusion matrix has `2m` columns.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QSDSystem<H, N> {
    pub hamiltonian: H,
    pub coupling: N,
}

impl<H: Tensor, N: Coupling> QSDSystem<H, N> {
    /// Check the operators against an `N x 1` initial state, returning `N`.
    ///
    /// # Errors
    ///
    /// Returns a [`DimensionError`] naming the first operand which disagrees.
    pub fn validate(&self, initial_state: &Array2<Complex<f64>>) -> Result<usize, DimensionError> {
        validate_dimensions(&self.hamiltonian, &self.coupling, initial_state)
    }

    /// The number of real Wiener processes driving the system
    #[inline]
    pub fn n_noise(&self) -> usize {
        2 * self.coupling.len()
    }

    /// An evaluator for a single trajectory, which owns a fresh operator cache
    #[must_use]
    pub fn trajectory(&self, policy: CachePolicy) -> QSDTrajectory<'_, H, N> {
        QSDTrajectory {
            system: self,
            cache: OperatorCache::new(policy),
        }
    }

    /// The drift `a(\psi)`, given the parts of every coupling operator
    #[must_use]
    pub fn drift_from_parts(
        &self,
        parts: &[CouplingPart],
        state: &Array1<Complex<f64>>,
    ) -> Array1<Complex<f64>> {
        let mut diagonal = Complex::<f64>::default();
        // -i H |\psi>
        let mut out = Complex { re: 0f64, im: -1f64 } * &self.hamiltonian.dot(state);

        for (index, part) in parts.iter().enumerate() {
            // - 1/2 <L^\dagger><L> |\psi>
            diagonal -= 0.5 * part.expectation.norm_sqr();

            // + <L^\dagger> L |\psi>
            out += &(part.expectation.conj() * &part.l_state);

            // - 1/2 L^\dagger L |\psi>
            out -= &(Complex { re: 0.5, im: 0f64 }
                * &self.coupling.apply_adjoint(index, &part.l_state));
        }

        out += &(diagonal * state);
        out
    }

    /// The diffusion matrix, given the parts of every coupling operator.
    ///
    /// Column `j` holds `(L_j - <L_j>)|\psi> / \sqrt{2}`, driven by the real part
    /// of `d\xi_j`. Column `m + j` holds `i` times the same vector, driven by the
    /// imaginary part.
    #[must_use]
    pub fn diffusion_from_parts(
        parts: &[CouplingPart],
        state: &Array1<Complex<f64>>,
    ) -> Array2<Complex<f64>> {
        let n_operators = parts.len();
        let mut out = Array2::zeros([state.len(), 2 * n_operators]);

        for (index, part) in parts.iter().enumerate() {
            // (L - <L>) |\psi> / sqrt(2)
            let complex_noise = Complex::from(std::f64::consts::FRAC_1_SQRT_2)
                * &(&part.l_state - &(part.expectation * state));

            out.column_mut(n_operators + index)
                .assign(&(Complex::<f64>::i() * &complex_noise));
            out.column_mut(index).assign(&complex_noise);
        }
        out
    }
}

/// The [`QSDSystem`] as seen by a single trajectory.
///
/// Owns the [`OperatorCache`] shared by the drift and diffusion evaluations, so
/// that no state leaks between trajectories.
pub struct QSDTrajectory<'a, H, N> {
    system: &'a QSDSystem<H, N>,
    cache: OperatorCache,
}

impl<H, N> QSDTrajectory<'_, H, N> {
    /// Invalidate the cache, ready for a new trajectory
    pub fn reset(&mut self) {
        self.cache.reset();
    }

    #[must_use]
    pub fn cache(&self) -> &OperatorCache {
        &self.cache
    }
}

impl<H: Tensor, N: Coupling> SDESystem for QSDTrajectory<'_, H, N> {
    #[inline]
    fn drift(&mut self, state: &Array1<Complex<f64>>, t: f64) -> Array1<Complex<f64>> {
        let parts = self.cache.ensure_current(&self.system.coupling, state, t);
        self.system.drift_from_parts(parts, state)
    }

    #[inline]
    fn diffusion(&mut self, state: &Array1<Complex<f64>>, t: f64) -> Array2<Complex<f64>> {
        let parts = self.cache.ensure_current(&self.system.coupling, state, t);
        QSDSystem::<H, N>::diffusion_from_parts(parts, state)
    }

    #[inline]
    fn n_noise(&self) -> usize {
        self.system.n_noise()
    }
}
