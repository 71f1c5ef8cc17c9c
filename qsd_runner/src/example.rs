//! The damped ladder: a truncated oscillator of `n` levels, started in its top
//! level and relaxing through a single lowering operator.

use ndarray::{Array1, Array2};
use num_complex::Complex;
use qsd_solver::{
    sparse::{BandedArray, TransposedBandedArray},
    CouplingOperators, QSDSystem,
};

pub type LadderSystem = QSDSystem<
    BandedArray<Complex<f64>>,
    CouplingOperators<BandedArray<Complex<f64>>, TransposedBandedArray<Complex<f64>>>,
>;

/// The ladder operator with `sqrt(k)` on the first superdiagonal
fn lowering_operator(n: usize) -> BandedArray<Complex<f64>> {
    let mut out = Array2::zeros([n, n]);
    for k in 1..n {
        #[allow(clippy::cast_precision_loss)]
        let amplitude = (k as f64).sqrt();
        out[[k - 1, k]] = Complex::from(amplitude);
    }
    BandedArray::from_dense(&out)
}

/// `H = I` with a single lowering operator
pub fn system(n: usize) -> LadderSystem {
    QSDSystem {
        hamiltonian: BandedArray::from_dense(&Array2::eye(n)),
        coupling: CouplingOperators::from_banded(&[lowering_operator(n)]),
    }
}

/// All population in the top level, as an `n x 1` column
pub fn initial_state(n: usize) -> Array2<Complex<f64>> {
    let mut out = Array2::zeros([n, 1]);
    out[[n - 1, 0]] = Complex::from(1f64);
    out
}

/// The diagonal observable `[0, 1, 2, 3, 0, 1, ...]`
pub fn observable(n: usize) -> BandedArray<Complex<f64>> {
    let diagonal = Array1::from_shape_fn(n, |i| {
        #[allow(clippy::cast_precision_loss)]
        let value = (i % 4) as f64;
        Complex::from(value)
    });
    BandedArray::from_dense(&Array2::from_diag(&diagonal))
}

#[cfg(test)]
mod test {
    use ndarray::{linalg::Dot, Array1};
    use num_complex::Complex;
    use qsd_solver::sparse::Tensor;

    use super::{initial_state, observable, system};

    #[test]
    fn test_shapes() {
        let system = system(8);
        assert_eq!(system.hamiltonian.shape(), [8, 8]);
        assert_eq!(system.validate(&initial_state(8)), Ok(8));
        assert_eq!(observable(8).shape(), [8, 8]);
    }

    #[test]
    fn test_observable_repeats() {
        let ones = Array1::from_elem(8, Complex::from(1f64));
        let values = observable(8).dot(&ones);
        let expected = [0.0, 1.0, 2.0, 3.0, 0.0, 1.0, 2.0, 3.0];
        for (value, expected) in values.iter().zip(expected) {
            assert_eq!(*value, Complex::from(expected));
        }
    }
}
