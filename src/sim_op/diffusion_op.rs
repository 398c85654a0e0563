use crate::sim::simulation::Simulation;
use crate::sim_op::SimOp;

/// Explicit five-point diffusion step: next += alpha * dt * laplacian(current).
///
/// The Laplacian mirrors missing neighbors, so diffusion alone never moves
/// energy across the domain edge; edge losses belong to `BoundaryLossOp`.
pub struct DiffusionOp {
    scratch: Vec<f64>,
}

impl DiffusionOp {
    pub fn new() -> Self {
        DiffusionOp { scratch: Vec::new() }
    }
}

impl Default for DiffusionOp {
    fn default() -> Self {
        Self::new()
    }
}

impl SimOp for DiffusionOp {
    fn name(&self) -> &str {
        "diffusion"
    }

    fn init_sim(&mut self, sim: &mut Simulation) {
        self.scratch = vec![0.0; sim.field.cell_count()];
    }

    fn update_sim(&mut self, sim: &mut Simulation) {
        let coeff = sim.props.thermal_diffusivity_m2_s() * sim.dt_s;
        if self.scratch.len() != sim.field.cell_count() {
            self.scratch = vec![0.0; sim.field.cell_count()];
        }
        for i in 0..sim.field.nx {
            for j in 0..sim.field.ny {
                self.scratch[sim.field.idx(i, j)] = sim.field.laplacian(i, j);
            }
        }
        let next = sim.field.next_values_mut();
        for (cell, lap) in next.iter_mut().zip(self.scratch.iter()) {
            *cell += coeff * lap;
        }
    }
}
