use ndarray::{s, Array1, Array3};
use num_complex::Complex;

use crate::sparse::Tensor;

pub trait Measurement {
    type Out;
    fn measure(&self, state: &Array1<Complex<f64>>) -> Self::Out;
}

pub struct StateMeasurement {}

impl Measurement for StateMeasurement {
    type Out = Array1<Complex<f64>>;
    fn measure(&self, state: &Array1<Complex<f64>>) -> Self::Out {
        state.clone()
    }
}

/// The expectation `<psi|O|psi>` of an observable, taken as `(O |psi>) . conj(|psi>)`
pub struct OperatorMeasurement<'a, T> {
    pub operator: &'a T,
}

impl<T: Tensor> Measurement for OperatorMeasurement<'_, T> {
    type Out = Complex<f64>;
    fn measure(&self, state: &Array1<Complex<f64>>) -> Self::Out {
        self.operator
            .dot(state)
            .iter()
            .zip(state.iter())
            .fold(Complex::default(), |acc, (o, s)| acc + o * s.conj())
    }
}

impl<M: Measurement> Measurement for [M] {
    type Out = Vec<M::Out>;
    fn measure(&self, state: &Array1<Complex<f64>>) -> Self::Out {
        self.iter().map(|m| m.measure(state)).collect()
    }
}

impl<M: Measurement> Measurement for Vec<M> {
    type Out = Vec<M::Out>;
    fn measure(&self, state: &Array1<Complex<f64>>) -> Self::Out {
        self.as_slice().measure(state)
    }
}

/// Reduce an ensemble of trajectories with shape `[n_trajectories, n_times, N]`
/// to the expectation of each observable, with shape
/// `[n_trajectories, n_times, observables.len()]`.
#[must_use]
pub fn expectation_values<O: Tensor>(
    states: &Array3<Complex<f64>>,
    observables: &[O],
) -> Array3<Complex<f64>> {
    let measurement = observables
        .iter()
        .map(|operator| OperatorMeasurement { operator })
        .collect::<Vec<_>>();

    let mut out = Array3::zeros([states.shape()[0], states.shape()[1], observables.len()]);
    for (i, trajectory) in states.outer_iter().enumerate() {
        for (j, state) in trajectory.outer_iter().enumerate() {
            let values = measurement.measure(&state.to_owned());
            out.slice_mut(s![i, j, ..]).assign(&Array1::from(values));
        }
    }
    out
}

#[cfg(test)]
mod test {
    use ndarray::{Array1, Array2, Array3};
    use num_complex::{Complex, ComplexFloat};

    use crate::sparse::BandedArray;

    use super::{expectation_values, Measurement, OperatorMeasurement, StateMeasurement};

    fn test_states() -> Array3<Complex<f64>> {
        Array3::from_shape_fn([2, 3, 4], |(i, j, k)| Complex {
            re: f64::from(u32::try_from(i + j).unwrap()) * 0.1 + 0.2,
            im: f64::from(u32::try_from(k).unwrap()) * 0.3 - 0.1,
        })
    }

    #[test]
    fn test_identity_observable_is_norm_squared() {
        let states = test_states();
        let expectations = expectation_values(&states, &[Array2::<Complex<f64>>::eye(4)]);
        assert_eq!(expectations.shape(), &[2, 3, 1]);

        for i in 0..2 {
            for j in 0..3 {
                let norm_sqr = (0..4).map(|k| states[[i, j, k]].norm_sqr()).sum::<f64>();
                assert!((expectations[[i, j, 0]] - Complex::from(norm_sqr)).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_real_diagonal_observable_is_real() {
        let states = test_states();
        let diagonal = Array2::from_diag(&Array1::from(vec![
            Complex::from(0f64),
            Complex::from(1f64),
            Complex::from(2f64),
            Complex::from(3f64),
        ]));
        let banded = BandedArray::from_dense(&diagonal);

        let dense_values = expectation_values(&states, &[diagonal]);
        let banded_values = expectation_values(&states, &[banded]);
        for (d, b) in dense_values.iter().zip(banded_values.iter()) {
            assert!(d.im.abs() < 1e-12);
            assert!((d - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_no_observables() {
        let expectations = expectation_values::<Array2<Complex<f64>>>(&test_states(), &[]);
        assert_eq!(expectations.shape(), &[2, 3, 0]);
    }

    #[test]
    fn test_measurement_of_many_operators() {
        let state = Array1::from(vec![Complex::from(0.6f64), Complex { re: 0f64, im: 0.8 }]);
        let operators = [Array2::<Complex<f64>>::eye(2), Array2::zeros([2, 2])];
        let measurement = operators
            .iter()
            .map(|operator| OperatorMeasurement { operator })
            .collect::<Vec<_>>();

        let values = measurement.measure(&state);
        assert!((values[0] - Complex::from(1f64)).abs() < 1e-12);
        assert!(values[1].abs() < 1e-12);
        assert_eq!(StateMeasurement {}.measure(&state), state);
    }
}
