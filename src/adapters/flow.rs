use crate::core::loss::batch_len;
use crate::core::DensityModel;
use crate::utils::error::{EvalError, Result};
use ndarray::{Array1, Array2, ArrayD, Axis, IxDyn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// `-0.5 * ln(2π)`
const LOG_INV_SQRT_2PI: f64 = -0.918_938_533_204_672_7;

#[inline]
fn standard_normal_logpdf(z: f64) -> f64 {
    LOG_INV_SQRT_2PI - 0.5 * z * z
}

/// How discrete data is turned into continuous values before the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dequantization {
    #[default]
    None,
    /// `y = (x + u) / num_bins` with `u ~ U[0, 1)` per element.
    Uniform { num_bins: u32 },
}

/// Element-wise affine flow onto a standard normal base distribution.
///
/// `z = (y - loc) * exp(-log_scale)` where `y` is the (optionally dequantized)
/// input. With uniform dequantization every call draws fresh noise, so
/// `log_prob` is a stochastic lower bound and importance weighting tightens it.
#[derive(Debug, Clone)]
pub struct AffineGaussianFlow {
    loc: Array1<f64>,
    log_scale: Array1<f64>,
    dequantization: Dequantization,
    rng: StdRng,
}

impl AffineGaussianFlow {
    pub fn new(
        loc: Vec<f64>,
        log_scale: Vec<f64>,
        dequantization: Dequantization,
        seed: u64,
    ) -> Result<Self> {
        if loc.is_empty() || loc.len() != log_scale.len() {
            return Err(EvalError::ShapeMismatch {
                context: "flow parameters".to_string(),
                expected: format!("{} log_scale entries", loc.len()),
                actual: log_scale.len().to_string(),
            });
        }
        if loc.iter().chain(log_scale.iter()).any(|v| !v.is_finite()) {
            return Err(EvalError::ModelError {
                message: "flow parameters must be finite".to_string(),
            });
        }
        if let Dequantization::Uniform { num_bins: 0 } = dequantization {
            return Err(EvalError::InvalidConfigValueError {
                field: "model.num_bins".to_string(),
                value: "0".to_string(),
                reason: "Value must be at least 1".to_string(),
            });
        }

        Ok(Self {
            loc: Array1::from(loc),
            log_scale: Array1::from(log_scale),
            dequantization,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn dims(&self) -> usize {
        self.loc.len()
    }

    pub fn dequantization(&self) -> Dequantization {
        self.dequantization
    }

    /// Latents as a `(batch, dims)` matrix and one ldj per example.
    fn forward(&mut self, x: &ArrayD<f64>) -> Result<(Array2<f64>, Array1<f64>)> {
        let n = batch_len(x)?;
        let d = self.dims();
        if x.len() != n * d {
            return Err(EvalError::ShapeMismatch {
                context: "flow input".to_string(),
                expected: format!("{} values per example", d),
                actual: format!("{:?}", x.shape()),
            });
        }

        let mut y = x.to_shape((n, d))?.to_owned();
        // `0.0 - sum` keeps a zero ldj at +0.0.
        let mut ldj = 0.0 - self.log_scale.sum();

        if let Dequantization::Uniform { num_bins } = self.dequantization {
            let bins = f64::from(num_bins);
            let rng = &mut self.rng;
            y.mapv_inplace(|v| (v + rng.gen::<f64>()) / bins);
            ldj -= d as f64 * bins.ln();
        }

        let inv_scale = self.log_scale.mapv(|s| (-s).exp());
        let z = (y - &self.loc) * &inv_scale;

        Ok((z, Array1::from_elem(n, ldj)))
    }
}

impl DensityModel for AffineGaussianFlow {
    fn log_prob(&mut self, x: &ArrayD<f64>) -> Result<Array1<f64>> {
        let (z, ldj) = self.forward(x)?;
        let base = z.map_axis(Axis(1), |row| {
            row.iter().map(|&v| standard_normal_logpdf(v)).sum::<f64>()
        });
        Ok(base + ldj)
    }

    fn z_ldj(&mut self, x: &ArrayD<f64>) -> Result<(ArrayD<f64>, Array1<f64>)> {
        let (z, ldj) = self.forward(x)?;
        let z = z.into_shape_with_order(IxDyn(x.shape()))?;
        Ok((z, ldj))
    }
}
