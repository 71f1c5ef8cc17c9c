use ndarray::{Array1, Array2};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

/// Independent increments of `n` real Wiener processes over a step `dt`
/// ``<dW_i dW_j> = delta_ij dt``
pub struct WienerIncrement {
    pub n: usize,
    pub dt: f64,
}

impl Distribution<Array1<f64>> for WienerIncrement {
    #[inline]
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Array1<f64> {
        let sqrt_dt = self.dt.sqrt();
        Array1::from_shape_fn(self.n, |_| rng.sample::<f64, _>(StandardNormal) * sqrt_dt)
    }
}

/// The iterated Ito integrals `I_{(j,k)}` over a single step, given the
/// increments `dw` of that step.
///
/// Uses the truncated Fourier series of Kloeden, Platen and Wright (1992), as
/// written in eqn 2.2 of Wiktorsson (2001) <https://doi.org/10.1214/aoap/1015345299>
/// ```latex
/// I = \frac{1}{2}(dW dW^T - dt \mathbb{1}) + A
/// A = \frac{dt}{2\pi} \sum_{k=1}^{n} \frac{1}{k} (X_k (Y_k + \sqrt{2/dt} dW)^T - (Y_k + \sqrt{2/dt} dW) X_k^T)
/// ```
/// where `X_k`, `Y_k` are standard normal vectors and `A` is the Levy area.
pub struct IteratedItoIntegral<'a> {
    pub dw: &'a Array1<f64>,
    pub dt: f64,
    pub n_terms: usize,
}

impl IteratedItoIntegral<'_> {
    fn levy_area<R: Rng + ?Sized>(&self, rng: &mut R) -> Array2<f64> {
        let m = self.dw.len();
        let sqrt_2_dt = (2.0 / self.dt).sqrt();
        let mut area = Array2::zeros([m, m]);

        for k in 1..=self.n_terms {
            let x = Array1::from_shape_fn(m, |_| rng.sample::<f64, _>(StandardNormal));
            let y = Array1::from_shape_fn(m, |_| rng.sample::<f64, _>(StandardNormal))
                + sqrt_2_dt * self.dw;
            #[allow(clippy::cast_precision_loss)]
            let scale = 1.0 / k as f64;
            for i in 0..m {
                for j in 0..m {
                    area[[i, j]] += scale * (x[i] * y[j] - y[i] * x[j]);
                }
            }
        }

        area * (self.dt / (2.0 * std::f64::consts::PI))
    }
}

impl Distribution<Array2<f64>> for IteratedItoIntegral<'_> {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Array2<f64> {
        let m = self.dw.len();
        let mut out = self.levy_area(rng);
        for i in 0..m {
            for j in 0..m {
                out[[i, j]] += 0.5 * self.dw[i] * self.dw[j];
            }
            out[[i, i]] -= 0.5 * self.dt;
        }
        out
    }
}

#[cfg(test)]
mod test {
    use ndarray::{Array1, Array2};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use super::{IteratedItoIntegral, WienerIncrement};

    #[test]
    fn test_wiener_increment_variance() {
        let mut rng = StdRng::seed_from_u64(7);
        let dt = 0.01;
        let n_samples = 20_000;
        let distribution = WienerIncrement { n: 2, dt };

        let mut sum_sq = 0f64;
        let mut sum = 0f64;
        for _ in 0..n_samples {
            let dw: Array1<f64> = rng.sample(&distribution);
            assert_eq!(dw.len(), 2);
            sum += dw[0];
            sum_sq += dw[0] * dw[0];
        }
        let mean = sum / f64::from(n_samples);
        let variance = sum_sq / f64::from(n_samples) - mean * mean;
        assert!(mean.abs() < 5e-3);
        assert!((variance - dt).abs() < 0.05 * dt);
    }

    #[test]
    fn test_iterated_integral_symmetric_part() {
        let mut rng = StdRng::seed_from_u64(11);
        let dt = 0.1;
        let dw = Array1::from(vec![0.3, -0.2, 0.1]);
        let integral: Array2<f64> = rng.sample(IteratedItoIntegral {
            dw: &dw,
            dt,
            n_terms: 5,
        });

        // I_jk + I_kj = dW_j dW_k - delta_jk dt, exactly
        for j in 0..3 {
            for k in 0..3 {
                let expected = dw[j] * dw[k] - if j == k { dt } else { 0.0 };
                assert!((integral[[j, k]] + integral[[k, j]] - expected).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_single_channel_has_no_levy_area() {
        let mut rng = StdRng::seed_from_u64(3);
        let dt = 0.04;
        let dw = Array1::from(vec![0.25]);
        let integral: Array2<f64> = rng.sample(IteratedItoIntegral {
            dw: &dw,
            dt,
            n_terms: 5,
        });
        assert!((integral[[0, 0]] - 0.5 * (0.25 * 0.25 - dt)).abs() < 1e-12);
    }
}
