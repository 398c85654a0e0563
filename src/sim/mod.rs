pub mod energy_accountant;
pub mod simulation;
pub mod superposition;
pub mod sweep;

pub use energy_accountant::{EfficiencyMetric, ElectricalLog, EnergyAccountant, PowerSample, ResultFlag};
pub use simulation::{HistorySample, RunOutcome, Simulation, StopReason};
pub use superposition::{run_spacing_sweep, SpacingSweepConfig, SpacingSweepOutcome, SuperpositionMode};
pub use sweep::{run_diameter_sweep, DiameterSweepConfig, DiameterSweepOutcome};
