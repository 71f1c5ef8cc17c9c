use ndarray::{Array1, Array2};
use num_complex::Complex;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::sparse::{dense_adjoint, BandedArray, Tensor, TransposedBandedArray};

/// The set of system-environment coupling operators `L_i` of an open system.
///
/// The order of the operators fixes the order of the noise channels.
pub trait Coupling {
    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn len(&self) -> usize;

    /// The shape of the operator `L_index`
    fn shape(&self, index: usize) -> [usize; 2];

    /// `L_index |\psi>` together with `<L_index>`
    fn get_part(&self, index: usize, state: &Array1<Complex<f64>>) -> CouplingPart;

    fn get_parts(&self, state: &Array1<Complex<f64>>) -> Vec<CouplingPart> {
        (0..self.len()).map(|i| self.get_part(i, state)).collect()
    }

    /// `L_index^\dagger |\phi>`
    fn apply_adjoint(&self, index: usize, state: &Array1<Complex<f64>>) -> Array1<Complex<f64>>;
}

/// The part of the SDE shared by the drift and diffusion of a single coupling operator
#[derive(Clone, Debug)]
pub struct CouplingPart {
    /// <L>, taken as `(L |\psi>) . conj(|\psi>)`
    pub(crate) expectation: Complex<f64>,
    /// L |\psi>
    pub(crate) l_state: Array1<Complex<f64>>,
}

impl CouplingPart {
    #[must_use]
    pub fn expectation(&self) -> Complex<f64> {
        self.expectation
    }

    #[must_use]
    pub fn l_state(&self) -> &Array1<Complex<f64>> {
        &self.l_state
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
struct CouplingSource<T, U> {
    operator: T,
    adjoint: U,
}

impl<T: Tensor, U: Tensor> CouplingSource<T, U> {
    #[inline]
    fn get_part(&self, state: &Array1<Complex<f64>>) -> CouplingPart {
        let l_state = self.operator.dot(state);

        assert_eq!(l_state.len(), state.len());
        let expectation = l_state
            .iter()
            .zip(state.iter())
            .fold(Complex::default(), |acc, (l, s)| acc + l * s.conj());

        CouplingPart {
            expectation,
            l_state,
        }
    }
}

/// Coupling operators stored together with their adjoint `L^\dagger`
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CouplingOperators<T, U>(Vec<CouplingSource<T, U>>);

impl CouplingOperators<Array2<Complex<f64>>, Array2<Complex<f64>>> {
    #[must_use]
    pub fn from_operators(operators: &[Array2<Complex<f64>>]) -> Self {
        Self(
            operators
                .iter()
                .map(|o| CouplingSource {
                    operator: o.to_owned(),
                    adjoint: dense_adjoint(o),
                })
                .collect(),
        )
    }
}

impl CouplingOperators<BandedArray<Complex<f64>>, TransposedBandedArray<Complex<f64>>> {
    #[must_use]
    pub fn from_banded(operators: &[BandedArray<Complex<f64>>]) -> Self {
        Self(
            operators
                .iter()
                .map(|o| CouplingSource {
                    operator: o.clone(),
                    adjoint: o.adjoint(),
                })
                .collect(),
        )
    }
}

impl<T, U> CouplingOperators<T, U> {
    /// A system with no coupling to its environment
    #[must_use]
    pub fn none() -> Self {
        Self(Vec::new())
    }
}

impl<T: Tensor, U: Tensor> Coupling for CouplingOperators<T, U> {
    #[inline]
    fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    fn shape(&self, index: usize) -> [usize; 2] {
        self.0[index].operator.shape()
    }

    #[inline]
    fn get_part(&self, index: usize, state: &Array1<Complex<f64>>) -> CouplingPart {
        self.0[index].get_part(state)
    }

    #[inline]
    fn get_parts(&self, state: &Array1<Complex<f64>>) -> Vec<CouplingPart> {
        self.0.iter().map(|s| s.get_part(state)).collect()
    }

    #[inline]
    fn apply_adjoint(&self, index: usize, state: &Array1<Complex<f64>>) -> Array1<Complex<f64>> {
        self.0[index].adjoint.dot(state)
    }
}
