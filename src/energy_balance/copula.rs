use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::errors::SimError;
use crate::math_utils::cholesky;

const UNIFORM_CLAMP: f64 = 1e-12;

/// Dependence structure between the daily energy components.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CopulaSpec {
    Independent,
    /// Gaussian copula over the given correlation matrix (component order is
    /// the sampler's: solar, biomass, actuator, parasitic).
    Gaussian { correlation: Vec<Vec<f64>> },
}

impl CopulaSpec {
    /// Adverse-day dependence: generation components move together and
    /// against the loads, strength `r` in (0, 1).
    pub fn adverse(r: f64) -> Self {
        CopulaSpec::Gaussian {
            correlation: vec![
                vec![1.0, r, -r, -r],
                vec![r, 1.0, -r, -r],
                vec![-r, -r, 1.0, r],
                vec![-r, -r, r, 1.0],
            ],
        }
    }

    pub fn compile(&self, dim: usize) -> Result<CompiledCopula, SimError> {
        match self {
            CopulaSpec::Independent => Ok(CompiledCopula::Independent),
            CopulaSpec::Gaussian { correlation } => {
                if correlation.len() != dim || correlation.iter().any(|row| row.len() != dim) {
                    return Err(SimError::InvalidConfiguration(format!(
                        "correlation matrix must be {dim}x{dim}"
                    )));
                }
                for i in 0..dim {
                    if (correlation[i][i] - 1.0).abs() > 1e-9 {
                        return Err(SimError::InvalidConfiguration(
                            "correlation matrix diagonal must be 1".to_string(),
                        ));
                    }
                    for j in 0..i {
                        if (correlation[i][j] - correlation[j][i]).abs() > 1e-9 {
                            return Err(SimError::InvalidConfiguration(
                                "correlation matrix must be symmetric".to_string(),
                            ));
                        }
                    }
                }
                let chol = cholesky(correlation).ok_or_else(|| {
                    SimError::SamplingError(
                        "correlation matrix is not positive definite".to_string(),
                    )
                })?;
                let unit_normal = Normal::new(0.0, 1.0)
                    .map_err(|e| SimError::SamplingError(format!("unit normal: {}", e)))?;
                Ok(CompiledCopula::Gaussian { chol, unit_normal })
            }
        }
    }
}

/// Copula ready to draw from.
#[derive(Debug, Clone)]
pub enum CompiledCopula {
    Independent,
    Gaussian { chol: Vec<Vec<f64>>, unit_normal: Normal },
}

impl CompiledCopula {
    /// Fill `out` with one vector of dependent uniforms in (0, 1).
    pub fn draw_uniforms<R: Rng + ?Sized>(&self, rng: &mut R, out: &mut [f64]) {
        match self {
            CompiledCopula::Independent => {
                for u in out.iter_mut() {
                    *u = rng
                        .random::<f64>()
                        .clamp(UNIFORM_CLAMP, 1.0 - UNIFORM_CLAMP);
                }
            }
            CompiledCopula::Gaussian { chol, unit_normal } => {
                let dim = out.len();
                let z: Vec<f64> = (0..dim).map(|_| rng.sample(StandardNormal)).collect();
                for (i, u) in out.iter_mut().enumerate() {
                    let x: f64 = chol[i].iter().zip(z.iter()).map(|(l, zj)| l * zj).sum();
                    *u = unit_normal
                        .cdf(x)
                        .clamp(UNIFORM_CLAMP, 1.0 - UNIFORM_CLAMP);
                }
            }
        }
    }
}
