use colored::Colorize;

use crate::sim::simulation::Simulation;
use crate::sim_op::SimOp;

/// Console progress reporting at a fixed step cadence, plus a run summary.
/// Attached only when the run is constructed in debug mode.
pub struct ProgressReportOp {
    pub every_steps: usize,
}

impl ProgressReportOp {
    pub fn new(every_steps: usize) -> Self {
        ProgressReportOp {
            every_steps: every_steps.max(1),
        }
    }
}

impl SimOp for ProgressReportOp {
    fn name(&self) -> &str {
        "progress_report"
    }

    fn init_sim(&mut self, sim: &mut Simulation) {
        println!(
            "{} {}x{} grid, dt={:.4e} s, {} chamber(s)",
            "🌡️ run start:".bold(),
            sim.field.nx,
            sim.field.ny,
            sim.dt_s,
            sim.chambers.len()
        );
    }

    fn update_sim(&mut self, sim: &mut Simulation) {
        if sim.step % self.every_steps != 0 {
            return;
        }
        let peak = sim.field.peak_kelvin();
        println!(
            "   step {:>6} | t={:8.2} s | peak {} | max dT/dt {:.3e} K/s",
            sim.step,
            sim.sim_time_s,
            format!("{:7.2} K", peak).yellow(),
            sim.max_dtdt_k_per_s
        );
    }

    fn after_sim(&mut self, sim: &mut Simulation) {
        println!(
            "{} {} steps, {:.2} s simulated | input {} | edge/face loss {}",
            "✅ run complete:".green().bold(),
            sim.step,
            sim.sim_time_s,
            format!("{:.2} J", sim.ledger.input_j).cyan(),
            format!("{:.2} J", sim.ledger.conv_loss_j).cyan()
        );
    }
}
