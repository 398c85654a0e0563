use thiserror::Error;

/// Error taxonomy for the simulation core.
///
/// Configuration errors abort before any stepping begins. Numerical divergence
/// is fatal for the run it occurs in but sweeps attach it to the per-run outcome
/// and keep going. Implausible results are NOT errors - they are warning-level
/// annotations on the output record (see `EnergyAccountant::classify`).
#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("time step {dt_s:.3e} s exceeds explicit stability bound {limit_s:.3e} s")]
    InvalidTimestep { dt_s: f64, limit_s: f64 },

    #[error("temperature field became non-finite at step {step}")]
    NumericalDivergence { step: usize },

    #[error("sampling failed: {0}")]
    SamplingError(String),
}
