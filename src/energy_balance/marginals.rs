use serde::{Deserialize, Serialize};
use statrs::distribution::{Beta, ContinuousCDF, LogNormal, Normal};

use crate::errors::SimError;

/// Quantile arguments are clamped away from 0 and 1 so inverse CDFs stay
/// finite for extreme copula draws.
const QUANTILE_CLAMP: f64 = 1e-12;

/// Marginal distribution of one daily energy factor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum MarginalSpec {
    /// Normal restricted to non-negative values (solar availability factor).
    TruncatedNormal { mean: f64, std_dev: f64 },
    /// Log-space location/scale (biomass conversion factor).
    LogNormal { location: f64, scale: f64 },
    /// Duty fraction on [0, 1] (actuator utilization).
    Beta { alpha: f64, beta: f64 },
    Uniform { low: f64, high: f64 },
    Constant { value: f64 },
}

impl MarginalSpec {
    pub fn validate(&self) -> Result<(), SimError> {
        match *self {
            MarginalSpec::TruncatedNormal { std_dev, .. } => {
                if std_dev <= 0.0 {
                    return Err(SimError::InvalidConfiguration(
                        "truncated normal std_dev must be positive".to_string(),
                    ));
                }
            }
            MarginalSpec::LogNormal { scale, .. } => {
                if scale <= 0.0 {
                    return Err(SimError::InvalidConfiguration(
                        "lognormal scale must be positive".to_string(),
                    ));
                }
            }
            MarginalSpec::Beta { alpha, beta } => {
                if alpha <= 0.0 || beta <= 0.0 {
                    return Err(SimError::InvalidConfiguration(
                        "beta shape parameters must be positive".to_string(),
                    ));
                }
            }
            MarginalSpec::Uniform { low, high } => {
                if low >= high {
                    return Err(SimError::InvalidConfiguration(format!(
                        "uniform bounds are empty: [{}, {}]",
                        low, high
                    )));
                }
            }
            MarginalSpec::Constant { value } => {
                if !value.is_finite() {
                    return Err(SimError::InvalidConfiguration(
                        "constant marginal must be finite".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn compile(&self) -> Result<CompiledMarginal, SimError> {
        self.validate()?;
        let compiled = match *self {
            MarginalSpec::TruncatedNormal { mean, std_dev } => {
                let dist = Normal::new(mean, std_dev).map_err(|e| {
                    SimError::SamplingError(format!("normal marginal: {}", e))
                })?;
                CompiledMarginal::TruncatedNormal { cdf_at_zero: dist.cdf(0.0), dist }
            }
            MarginalSpec::LogNormal { location, scale } => {
                let dist = LogNormal::new(location, scale).map_err(|e| {
                    SimError::SamplingError(format!("lognormal marginal: {}", e))
                })?;
                CompiledMarginal::LogNormal(dist)
            }
            MarginalSpec::Beta { alpha, beta } => {
                let dist = Beta::new(alpha, beta).map_err(|e| {
                    SimError::SamplingError(format!("beta marginal: {}", e))
                })?;
                CompiledMarginal::Beta(dist)
            }
            MarginalSpec::Uniform { low, high } => CompiledMarginal::Uniform { low, high },
            MarginalSpec::Constant { value } => CompiledMarginal::Constant(value),
        };
        Ok(compiled)
    }
}

/// Marginal with its quantile machinery resolved.
#[derive(Debug, Clone)]
pub enum CompiledMarginal {
    TruncatedNormal { dist: Normal, cdf_at_zero: f64 },
    LogNormal(LogNormal),
    Beta(Beta),
    Uniform { low: f64, high: f64 },
    Constant(f64),
}

impl CompiledMarginal {
    /// Inverse CDF at `u` in (0, 1).
    pub fn quantile(&self, u: f64) -> f64 {
        let u = u.clamp(QUANTILE_CLAMP, 1.0 - QUANTILE_CLAMP);
        match self {
            CompiledMarginal::TruncatedNormal { dist, cdf_at_zero } => {
                // Map u onto the untruncated CDF mass above zero
                let p = cdf_at_zero + u * (1.0 - cdf_at_zero);
                dist.inverse_cdf(p.clamp(QUANTILE_CLAMP, 1.0 - QUANTILE_CLAMP))
            }
            CompiledMarginal::LogNormal(dist) => dist.inverse_cdf(u),
            CompiledMarginal::Beta(dist) => dist.inverse_cdf(u),
            CompiledMarginal::Uniform { low, high } => low + u * (high - low),
            CompiledMarginal::Constant(value) => *value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use more_asserts::{assert_ge, assert_le, assert_lt};

    #[test]
    fn truncated_normal_never_goes_negative() {
        let marginal = MarginalSpec::TruncatedNormal { mean: 0.2, std_dev: 1.0 }
            .compile()
            .unwrap();
        for &u in &[1e-9, 0.01, 0.5, 0.99, 1.0 - 1e-9] {
            assert_ge!(marginal.quantile(u), 0.0);
        }
    }

    #[test]
    fn normal_median_passes_through_untruncated() {
        // Mean far above zero: truncation mass is negligible
        let marginal = MarginalSpec::TruncatedNormal { mean: 1.0, std_dev: 0.05 }
            .compile()
            .unwrap();
        assert_relative_eq!(marginal.quantile(0.5), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn beta_quantile_stays_in_unit_interval() {
        let marginal = MarginalSpec::Beta { alpha: 2.0, beta: 5.0 }.compile().unwrap();
        for &u in &[0.001, 0.25, 0.5, 0.75, 0.999] {
            let x = marginal.quantile(u);
            assert_ge!(x, 0.0);
            assert_le!(x, 1.0);
        }
    }

    #[test]
    fn lognormal_median_is_exp_location() {
        let marginal = MarginalSpec::LogNormal { location: -0.3, scale: 0.5 }
            .compile()
            .unwrap();
        assert_relative_eq!(marginal.quantile(0.5), (-0.3f64).exp(), epsilon = 1e-9);
    }

    #[test]
    fn quantiles_are_monotone_in_u() {
        let marginal = MarginalSpec::LogNormal { location: 0.0, scale: 1.0 }
            .compile()
            .unwrap();
        assert_lt!(marginal.quantile(0.1), marginal.quantile(0.9));
    }

    #[test]
    fn invalid_parameters_are_rejected_before_sampling() {
        assert!(MarginalSpec::TruncatedNormal { mean: 1.0, std_dev: 0.0 }.compile().is_err());
        assert!(MarginalSpec::Beta { alpha: -2.0, beta: 5.0 }.compile().is_err());
        assert!(MarginalSpec::Uniform { low: 2.0, high: 1.0 }.compile().is_err());
    }
}
