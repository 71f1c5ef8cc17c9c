use ndarray::{Array1, Array2};
use num_complex::Complex;

use crate::system::SDESystem;

pub type SimpleStochasticFn =
    dyn Fn(f64, &Array1<Complex<f64>>) -> Array1<Complex<f64>> + Send + Sync;

/// Box a closure as a [`SimpleStochasticFn`]
pub fn stochastic_fn<F>(f: F) -> Box<SimpleStochasticFn>
where
    F: Fn(f64, &Array1<Complex<f64>>) -> Array1<Complex<f64>> + Send + Sync + 'static,
{
    Box::new(f)
}

/// A Simple Stochastic System where the drift and each column of the diffusion are given by functions
pub struct SimpleStochasticSDESystem {
    pub drift: Box<SimpleStochasticFn>,
    pub diffusion: Vec<Box<SimpleStochasticFn>>,
}

impl SDESystem for SimpleStochasticSDESystem {
    fn drift(&mut self, state: &Array1<Complex<f64>>, t: f64) -> Array1<Complex<f64>> {
        (self.drift)(t, state)
    }

    fn diffusion(&mut self, state: &Array1<Complex<f64>>, t: f64) -> Array2<Complex<f64>> {
        let mut out = Array2::zeros([state.len(), self.diffusion.len()]);
        for (mut column, f) in out.columns_mut().into_iter().zip(&self.diffusion) {
            column.assign(&f(t, state));
        }
        out
    }

    fn n_noise(&self) -> usize {
        self.diffusion.len()
    }
}
