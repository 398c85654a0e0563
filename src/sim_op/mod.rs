// Step pipeline operators for the chamber heat simulation.
//
// Each simulation step resets the working buffer, runs the configured ops in
// order (source deposition -> diffusion -> boundary loss -> latent band),
// then commits. Ops read the committed state and write the working buffer.
pub mod boundary_loss_op;
pub mod diffusion_op;
pub mod latent_band_op;
pub mod progress_report_op;
pub mod source_deposition_op;

pub use boundary_loss_op::BoundaryLossOp;
pub use diffusion_op::DiffusionOp;
pub use latent_band_op::LatentBandOp;
pub use progress_report_op::ProgressReportOp;
pub use source_deposition_op::SourceDepositionOp;

use crate::sim::simulation::Simulation;

pub trait SimOp {
    /// The name of this operator (for identification and timing reports)
    fn name(&self) -> &str;

    /// Called once before the first step
    fn init_sim(&mut self, _sim: &mut Simulation) {
        // Default implementation does nothing
    }

    /// Called every simulation step
    fn update_sim(&mut self, _sim: &mut Simulation) {
        // Default implementation does nothing
    }

    /// Called once after the run terminates
    fn after_sim(&mut self, _sim: &mut Simulation) {
        // Default implementation does nothing
    }
}
