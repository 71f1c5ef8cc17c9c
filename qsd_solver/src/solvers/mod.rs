use ndarray::Array1;
use ndarray_linalg::Norm;
use num_complex::Complex;

use rand::Rng;

use crate::system::SDESystem;

pub mod order_1;
pub use order_1::*;
pub mod solver;
pub use solver::*;

/// Wraps a [`Stepper`], renormalizing the state after every step
#[derive(Default)]
pub struct NormalizedStepper<S>(pub S);

impl<S: Stepper> Stepper for NormalizedStepper<S> {
    fn step<T: SDESystem, R: Rng + ?Sized>(
        &self,
        state: &Array1<Complex<f64>>,
        system: &mut T,
        t: f64,
        dt: f64,
        rng: &mut R,
    ) -> Array1<Complex<f64>> {
        let mut out = self.0.step(state, system, t, dt, rng);
        // Normalize the state
        out /= Complex {
            re: out.norm_l2(),
            im: 0f64,
        };
        out
    }
}

/// The integration method used for every trajectory of an ensemble
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Method {
    Euler,
    Milsten,
    #[default]
    Sri2,
}

#[cfg(test)]
mod test {
    use ndarray::{Array1, Array2};
    use ndarray_linalg::Norm;
    use num_complex::Complex;
    use rand::{rngs::StdRng, SeedableRng};

    use crate::{
        system::{
            cache::CachePolicy,
            coupling::CouplingOperators,
            qsd::QSDSystem,
            simple_stochastic::{stochastic_fn, SimpleStochasticSDESystem},
        },
        tests::{get_initial_state, get_random_system},
    };

    use super::{EulerStepper, FixedStepSolver, NormalizedStepper, Solver, Sri2Stepper, Stepper};

    #[test]
    fn test_normalized_stepper_returns_unit_state() {
        let mut system = SimpleStochasticSDESystem {
            drift: stochastic_fn(|_t, state| state * Complex::from(0.5f64)),
            diffusion: vec![stochastic_fn(|_t, state| state * Complex::from(0.3f64))],
        };
        let mut rng = StdRng::seed_from_u64(1);
        let initial = Array1::from(vec![Complex::from(0.6f64), Complex { re: 0f64, im: 0.8 }]);

        let stepper = NormalizedStepper(EulerStepper {});
        let mut state = initial;
        for i in 0..10 {
            state = stepper.step(&state, &mut system, f64::from(i) * 0.1, 0.1, &mut rng);
            assert!((state.norm_l2() - 1f64).abs() < 1e-12);
        }
    }

    #[test]
    fn test_unitary_evolution_conserves_norm() {
        let n = 4;
        let system = QSDSystem {
            hamiltonian: Array2::from_diag(&Array1::from_shape_fn(n, |i| {
                Complex::from(f64::from(u32::try_from(i).unwrap()))
            })),
            coupling: CouplingOperators::<Array2<Complex<f64>>, Array2<Complex<f64>>>::none(),
        };
        let mut rng = StdRng::seed_from_u64(2);
        let tspan = (0..50).map(|i| f64::from(i) * 0.02).collect::<Vec<_>>();

        let mut initial = Array1::from_elem(n, Complex::from(0.5f64));
        initial[0] = Complex { re: 0f64, im: 0.5 };
        let result = FixedStepSolver {
            stepper: Sri2Stepper::default(),
            target_dt: 1e-3,
        }
        .integrate(&initial, &mut system.trajectory(CachePolicy::default()), &tspan, &mut rng)
        .unwrap();

        for row in result.rows() {
            assert!((row.norm_l2() - 1f64).abs() < 1e-6);
        }
    }

    #[test]
    fn test_qsd_norm_is_conserved_in_mean() {
        let (n_operators, n_states) = (2, 4);
        let system = get_random_system(n_operators, n_states);
        let initial = get_initial_state(n_states);
        let tspan = (0..=20).map(|i| f64::from(i) * 0.005).collect::<Vec<_>>();

        let mut rng = StdRng::seed_from_u64(3);
        let result = FixedStepSolver {
            stepper: Sri2Stepper::default(),
            target_dt: 1e-4,
        }
        .integrate(&initial, &mut system.trajectory(CachePolicy::TimeAndState), &tspan, &mut rng)
        .unwrap();

        let last = result.row(tspan.len() - 1);
        assert!((last.norm_l2() - 1f64).abs() < 1e-2);
    }
}
