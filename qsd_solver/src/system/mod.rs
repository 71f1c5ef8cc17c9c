use ndarray::{Array1, Array2};
use num_complex::Complex;

pub mod cache;
pub mod coupling;
pub mod qsd;
pub mod simple_stochastic;
pub mod validate;

/// Represents a SDE System, seperated into a 'drift' term and a series of 'diffusion' terms
///
/// ```latex
/// X_t = X_{t0} + \int_{t0}^{t} a(s,X) ds + \sum_1^m \int_{t0}^{t} b^j(s, X_s) dW_s^j
/// ```
///
/// Where `a(t,X)` is the drift at time t, and `b^j(t,X)` is the j'th column of the
/// diffusion matrix, driven by the real Wiener process `W^j`.
///
/// Evaluation takes `&mut self` so that a system may cache work between the
/// drift and diffusion calls a solver makes within a single step.
#[allow(clippy::module_name_repetitions)]
pub trait SDESystem {
    /// The drift `a(t,X)`
    fn drift(&mut self, state: &Array1<Complex<f64>>, t: f64) -> Array1<Complex<f64>>;

    /// The diffusion matrix, with shape `[state.len(), self.n_noise()]`
    fn diffusion(&mut self, state: &Array1<Complex<f64>>, t: f64) -> Array2<Complex<f64>>;

    /// The total number of real Wiener processes driving the system
    fn n_noise(&self) -> usize;

    /// Get the increment `a(t,X) dt + \sum_j b^j(t,X) dW^j`
    #[inline]
    fn get_step(
        &mut self,
        state: &Array1<Complex<f64>>,
        t: f64,
        dt: f64,
        dw: &Array1<f64>,
    ) -> Array1<Complex<f64>> {
        let mut out = Complex { re: dt, im: 0f64 } * &self.drift(state, t);
        out += &apply_noise(&self.diffusion(state, t), dw);
        out
    }
}

/// Get `\sum_j b^j dW^j` for a diffusion matrix `b`
#[must_use]
pub fn apply_noise(diffusion: &Array2<Complex<f64>>, dw: &Array1<f64>) -> Array1<Complex<f64>> {
    assert_eq!(diffusion.ncols(), dw.len());
    if dw.is_empty() {
        return Array1::zeros(diffusion.nrows());
    }
    diffusion.dot(&dw.mapv(|w| Complex { re: w, im: 0f64 }))
}
