use ndarray::{Array1, Array2};
use num_complex::Complex;

use rand::Rng;

use crate::{
    distribution::{IteratedItoIntegral, WienerIncrement},
    system::{apply_noise, SDESystem},
};

use super::Stepper;

#[inline]
fn to_complex(real: &Array2<f64>) -> Array2<Complex<f64>> {
    real.mapv(|r| Complex { re: r, im: 0f64 })
}

#[derive(Default)]
#[allow(clippy::module_name_repetitions)]
pub struct EulerStepper {}

impl Stepper for EulerStepper {
    fn step<T: SDESystem, R: Rng + ?Sized>(
        &self,
        state: &Array1<Complex<f64>>,
        system: &mut T,
        t: f64,
        dt: f64,
        rng: &mut R,
    ) -> Array1<Complex<f64>> {
        // The basic euler method
        // Y_n+1 = Y_n + a dt + \sum_k b_k dW
        // where dW are normalized gaussian random variables,  <dW_k dW_k'> = dt
        let dw = rng.sample(WienerIncrement {
            n: system.n_noise(),
            dt,
        });

        state + system.get_step(state, t, dt, &dw)
    }
}

/// The derivative free milsten scheme for commuting noise, eqn 11.1.7 in
/// <https://doi.org/10.1007/978-3-662-12616-5>
#[derive(Default)]
pub struct MilstenStepper {}

impl Stepper for MilstenStepper {
    fn step<T: SDESystem, R: Rng + ?Sized>(
        &self,
        state: &Array1<Complex<f64>>,
        system: &mut T,
        t: f64,
        dt: f64,
        rng: &mut R,
    ) -> Array1<Complex<f64>> {
        // Y(n+1) = Y(n) + a dt + \sum_j b^j dW^j
        //   + \frac{1}{\sqrt{dt}} \sum_{j1, j2} (b^{j2}(\bar{Y}_{j1}) - b^{j2}(Y)) I_{(j1, j2)}
        // with the supporting values \bar{Y}_{j1} = Y(n) + a dt + b^{j1} \sqrt{dt}
        let n_noise = system.n_noise();
        let dw = rng.sample(WienerIncrement { n: n_noise, dt });

        let drift_step = Complex { re: dt, im: 0f64 } * &system.drift(state, t);
        let diffusion = system.diffusion(state, t);

        let mut out = state + &drift_step;
        out += &apply_noise(&diffusion, &dw);
        if n_noise == 0 {
            return out;
        }

        // For commuting noise the levy area does not contribute
        let iterated: Array2<f64> = rng.sample(IteratedItoIntegral {
            dw: &dw,
            dt,
            n_terms: 0,
        });

        let sqrt_dt = dt.sqrt();
        let drift_supporting_state = state + &drift_step;
        for (j1, b_j1) in diffusion.columns().into_iter().enumerate() {
            let supporting_state = &drift_supporting_state + &(&b_j1 * sqrt_dt);
            let supporting_diffusion = system.diffusion(&supporting_state, t) - &diffusion;

            let weights = iterated.row(j1).mapv(|i| Complex {
                re: i / sqrt_dt,
                im: 0f64,
            });
            out += &supporting_diffusion.dot(&weights);
        }

        out
    }
}

/// The order 1.0 strong Stochastic Runge-Kutta scheme SRI2 of Rossler (2010),
/// table 2 of <https://doi.org/10.1137/09076636X>
///
/// The iterated integrals are drawn from [`IteratedItoIntegral`], with `n_terms`
/// terms of the Levy area series.
pub struct Sri2Stepper {
    pub n_terms: usize,
}

impl Default for Sri2Stepper {
    fn default() -> Self {
        Self { n_terms: 5 }
    }
}

impl Stepper for Sri2Stepper {
    fn step<T: SDESystem, R: Rng + ?Sized>(
        &self,
        state: &Array1<Complex<f64>>,
        system: &mut T,
        t: f64,
        dt: f64,
        rng: &mut R,
    ) -> Array1<Complex<f64>> {
        let n_noise = system.n_noise();
        let dw = rng.sample(WienerIncrement { n: n_noise, dt });

        let sqrt_dt = dt.sqrt();
        let half_dt = Complex {
            re: 0.5 * dt,
            im: 0f64,
        };

        let drift = system.drift(state, t);
        let diffusion = system.diffusion(state, t);

        // H_2^(0) = Y(n) + a(Y(n)) dt
        let h20 = state + &(Complex { re: dt, im: 0f64 } * &drift);

        // Y(n+1) = Y(n) + 1/2 (a(Y(n)) + a(H_2^(0))) dt + \sum_k b^k dW^k + ...
        let mut out = state + &(half_dt * &drift);
        out += &(half_dt * &system.drift(&h20, t + dt));
        out += &apply_noise(&diffusion, &dw);
        if n_noise == 0 {
            return out;
        }

        let iterated: Array2<f64> = rng.sample(IteratedItoIntegral {
            dw: &dw,
            dt,
            n_terms: self.n_terms,
        });
        // \sum_l b^l I_(l, k) / \sqrt{dt}
        let support = diffusion.dot(&to_complex(&iterated)) * Complex::from(1.0 / sqrt_dt);

        // ... + \frac{\sqrt{dt}}{2} \sum_k (b^k(H_2^(k)) - b^k(H_3^(k)))
        let half_sqrt_dt = Complex {
            re: 0.5 * sqrt_dt,
            im: 0f64,
        };
        for (k, support_k) in support.columns().into_iter().enumerate() {
            let h2 = &h20 + &support_k;
            let h3 = &h20 - &support_k;
            let b_plus = system.diffusion(&h2, t + dt);
            let b_minus = system.diffusion(&h3, t + dt);
            out += &(half_sqrt_dt * &(&b_plus.column(k) - &b_minus.column(k)));
        }

        out
    }
}
