use crate::sim::simulation::Simulation;
use crate::sim_op::SimOp;

/// Enthalpy-method latent-heat band for phase-change materials.
///
/// Runs last in the pipeline, comparing the committed state against the
/// working buffer. Sensible rise that would carry a cell above the melt onset
/// is diverted into a per-cell latent accumulator until the accumulator holds
/// the full latent capacity; cooling back through the band releases stored
/// latent energy before the temperature may fall. Net effect: |dT/dt| inside
/// the band is strictly below the value the same power would produce outside.
pub struct LatentBandOp;

impl SimOp for LatentBandOp {
    fn name(&self) -> &str {
        "latent_band"
    }

    fn update_sim(&mut self, sim: &mut Simulation) {
        let Some(band) = sim.boundary.latent_band else {
            return;
        };
        let capacity_j = sim.latent_capacity_per_cell_j;
        if capacity_j <= 0.0 {
            return;
        }
        let joules_per_k = sim.props.volumetric_heat_capacity_j_m3_k() * sim.cell_volume_m3();

        let current = std::mem::take(&mut sim.latent_store_j);
        let mut store = current;
        {
            let old = sim.field.current_values().to_vec();
            let next = sim.field.next_values_mut();
            for (cell, (t_new, &t_old)) in next.iter_mut().zip(old.iter()).enumerate() {
                // Melting: absorb the portion of this step's rise above the onset
                if *t_new > band.t_melt_low_k && store[cell] < capacity_j {
                    let rise_k = *t_new - t_old.max(band.t_melt_low_k);
                    if rise_k > 0.0 {
                        let absorbed_j = (rise_k * joules_per_k).min(capacity_j - store[cell]);
                        store[cell] += absorbed_j;
                        *t_new -= absorbed_j / joules_per_k;
                    }
                }
                // Freezing: release stored latent heat before temperature drops
                if *t_new < band.t_melt_high_k && store[cell] > 0.0 {
                    let drop_k = t_old.min(band.t_melt_high_k) - *t_new;
                    if drop_k > 0.0 {
                        let released_j = (drop_k * joules_per_k).min(store[cell]);
                        store[cell] -= released_j;
                        *t_new += released_j / joules_per_k;
                    }
                }
            }
        }
        sim.latent_store_j = store;
    }
}
