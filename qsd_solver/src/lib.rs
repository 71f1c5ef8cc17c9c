#![warn(clippy::pedantic)]

pub mod distribution;
pub mod ensemble;
pub mod error;
pub mod measurement;
pub mod solvers;
pub mod sparse;
pub mod system;

pub use ensemble::{qsd_solve, EnsembleSolver, QSDResult};
pub use error::{DimensionError, QSDError, SolverError};
pub use system::{cache::CachePolicy, coupling::CouplingOperators, qsd::QSDSystem};

#[cfg(test)]
mod tests {
    use ndarray::{Array1, Array2};
    use num_complex::Complex;
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use rand_distr::StandardNormal;

    use crate::system::{coupling::CouplingOperators, qsd::QSDSystem};

    type DenseCoupling = CouplingOperators<Array2<Complex<f64>>, Array2<Complex<f64>>>;

    fn get_random_operator<R: Rng>(rng: &mut R, n_states: usize) -> Array2<Complex<f64>> {
        // Scaled so that the spectral radius stays of order one
        #[allow(clippy::cast_precision_loss)]
        let scale = 1.0 / (n_states as f64).sqrt();
        Array2::from_shape_fn([n_states, n_states], |_| Complex {
            re: rng.sample::<f64, _>(StandardNormal) * scale,
            im: rng.sample::<f64, _>(StandardNormal) * scale,
        })
    }

    pub(crate) fn get_random_system(
        n_operators: usize,
        n_states: usize,
    ) -> QSDSystem<Array2<Complex<f64>>, DenseCoupling> {
        let mut rng = StdRng::seed_from_u64(
            u64::try_from(1000 * n_operators + n_states).unwrap(),
        );
        let hamiltonian = get_random_operator(&mut rng, n_states);
        let operators = (0..n_operators)
            .map(|_| get_random_operator(&mut rng, n_states))
            .collect::<Vec<_>>();

        QSDSystem {
            hamiltonian,
            coupling: CouplingOperators::from_operators(&operators),
        }
    }

    pub(crate) fn get_initial_state(n_states: usize) -> Array1<Complex<f64>> {
        let mut state = Array1::zeros([n_states]);
        state[0] = Complex { re: 1f64, im: 0f64 };
        state
    }

    /// The ladder operator with `sqrt(k)` on the first superdiagonal
    pub(crate) fn lowering_operator(n_states: usize) -> Array2<Complex<f64>> {
        let mut out = Array2::zeros([n_states, n_states]);
        for k in 1..n_states {
            out[[k - 1, k]] = Complex::from(f64::from(u32::try_from(k).unwrap()).sqrt());
        }
        out
    }

    #[test]
    fn test_random_system_is_reproducible() {
        let first = get_random_system(2, 3);
        let second = get_random_system(2, 3);
        assert_eq!(first.hamiltonian, second.hamiltonian);
        assert_eq!(first.hamiltonian.shape(), &[3, 3]);
    }

    #[test]
    fn test_lowering_operator_lowers() {
        let operator = lowering_operator(4);
        let lowered = operator.dot(&get_initial_state(4).mapv(|_| Complex::from(1f64)));
        assert_eq!(lowered[3], Complex::from(0f64));
        assert_eq!(lowered[0], Complex::from(1f64));
    }
}
