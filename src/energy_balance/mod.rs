pub mod copula;
pub mod marginals;
pub mod sampler;

pub use copula::{CompiledCopula, CopulaSpec};
pub use marginals::{CompiledMarginal, MarginalSpec};
pub use sampler::{
    CorrelationComparison, EnergyBalanceConfig, EnergyBalanceSample, EnergyBalanceSampler,
    EnergyBalanceStats,
};
