use ndarray::Array2;
use num_complex::Complex;

use crate::{error::DimensionError, sparse::Tensor};

use super::coupling::Coupling;

/// Check that the initial state is an `N x 1` column and that the Hamiltonian and
/// every coupling operator are `N x N`.
///
/// Returns the dimension `N` of the state.
///
/// # Errors
///
/// Returns a [`DimensionError`] naming the first operand which disagrees.
pub fn validate_dimensions<H: Tensor, N: Coupling>(
    hamiltonian: &H,
    coupling: &N,
    initial_state: &Array2<Complex<f64>>,
) -> Result<usize, DimensionError> {
    let [n, cols] = [initial_state.nrows(), initial_state.ncols()];
    if cols != 1 {
        return Err(DimensionError::InitialState { rows: n, cols });
    }
    if n == 0 {
        return Err(DimensionError::EmptyState);
    }

    let [rows, cols] = hamiltonian.shape();
    if rows != n || cols != n {
        return Err(DimensionError::Hamiltonian {
            expected: n,
            rows,
            cols,
        });
    }

    for index in 0..coupling.len() {
        let [rows, cols] = coupling.shape(index);
        if rows != n || cols != n {
            return Err(DimensionError::CouplingOperator {
                index,
                expected: n,
                rows,
                cols,
            });
        }
    }
    Ok(n)
}

/// Check that every observable is `N x N`.
///
/// # Errors
///
/// Returns [`DimensionError::Observable`] for the first observable which disagrees.
pub fn validate_observables<O: Tensor>(observables: &[O], n: usize) -> Result<(), DimensionError> {
    observables
        .iter()
        .enumerate()
        .try_for_each(|(index, observable)| match observable.shape() {
            [rows, cols] if rows == n && cols == n => Ok(()),
            [rows, cols] => Err(DimensionError::Observable {
                index,
                expected: n,
                rows,
                cols,
            }),
        })
}
