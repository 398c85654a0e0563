use crate::sim::simulation::Simulation;
use crate::sim_op::SimOp;

/// Deposits chamber power into the working buffer as a uniform volumetric
/// source over each chamber footprint.
///
/// The per-step injected energy equals `power_at(t) * dt` exactly, with the
/// active power level following the chamber's duty cycle, so the energy
/// ledger stays consistent with the configured Q_high / Q_low levels.
pub struct SourceDepositionOp;

impl SimOp for SourceDepositionOp {
    fn name(&self) -> &str {
        "source_deposition"
    }

    fn update_sim(&mut self, sim: &mut Simulation) {
        let dt = sim.dt_s;
        let t = sim.sim_time_s;
        let rho_cp = sim.props.volumetric_heat_capacity_j_m3_k();

        for (chamber, footprint) in sim.chambers.iter().zip(sim.footprints.iter()) {
            let power_w = chamber.power_at(t);
            if power_w <= 0.0 {
                continue;
            }
            // Uniform temperature-rise rate over the footprint volume
            let delta_k = power_w * dt / (rho_cp * footprint.volume_m3);
            let next = sim.field.next_values_mut();
            for &cell in &footprint.cells {
                next[cell] += delta_k;
            }
            sim.ledger.input_j += power_w * dt;
        }
    }
}
