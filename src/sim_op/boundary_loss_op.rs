use crate::boundary::EdgeCondition;
use crate::sim::simulation::Simulation;
use crate::sim_op::SimOp;

/// Imposes the configured edge condition after diffusion, plus the optional
/// slab-face convective film over every cell. Energy removed to ambient is
/// accumulated into the run ledger so retained-vs-loss efficiency can be
/// reported.
pub struct BoundaryLossOp;

impl BoundaryLossOp {
    /// Lumped-node relaxation: T -= coeff * (T - T_inf). Returns the energy
    /// removed (J, positive when heat left the domain).
    fn relax(next: &mut [f64], cells: &[usize], coeff: f64, ambient_k: f64, joules_per_k: f64) -> f64 {
        let mut removed_j = 0.0;
        for &cell in cells {
            let delta_k = coeff * (next[cell] - ambient_k);
            next[cell] -= delta_k;
            removed_j += delta_k * joules_per_k;
        }
        removed_j
    }
}

impl SimOp for BoundaryLossOp {
    fn name(&self) -> &str {
        "boundary_loss"
    }

    fn update_sim(&mut self, sim: &mut Simulation) {
        let dt = sim.dt_s;
        let rho_cp = sim.props.volumetric_heat_capacity_j_m3_k();
        let ambient = sim.boundary.ambient_k;
        let cell_volume = sim.cell_volume_m3();
        let joules_per_k = rho_cp * cell_volume;

        match sim.boundary.edge {
            EdgeCondition::FixedTemperature => {
                // Pinned edges: the sink absorbs whatever the edge cells hold.
                let edge_cells = std::mem::take(&mut sim.edge_cells);
                let next = sim.field.next_values_mut();
                for &cell in &edge_cells {
                    let surplus = next[cell] - ambient;
                    next[cell] = ambient;
                    sim.ledger.conv_loss_j += surplus * joules_per_k;
                }
                sim.edge_cells = edge_cells;
            }
            EdgeCondition::Robin { h_w_m2_k } if h_w_m2_k > 0.0 => {
                let coeff = h_w_m2_k * dt / (rho_cp * sim.field.dx_m);
                let edge_cells = std::mem::take(&mut sim.edge_cells);
                let removed =
                    Self::relax(sim.field.next_values_mut(), &edge_cells, coeff, ambient, joules_per_k);
                sim.edge_cells = edge_cells;
                sim.ledger.conv_loss_j += removed;
            }
            _ => {}
        }

        let face_h = sim.boundary.face_h_w_m2_k;
        if face_h > 0.0 {
            let coeff = face_h * dt / (rho_cp * sim.thickness_m());
            let next = sim.field.next_values_mut();
            let mut removed_j = 0.0;
            for cell in next.iter_mut() {
                let delta_k = coeff * (*cell - ambient);
                *cell -= delta_k;
                removed_j += delta_k * joules_per_k;
            }
            sim.ledger.conv_loss_j += removed_j;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::BoundaryConditionSpec;
    use crate::sim::simulation::Simulation;
    use crate::test_support::insulated_single_chamber_config;
    use approx::assert_relative_eq;
    use more_asserts::{assert_gt, assert_lt};

    #[test]
    fn robin_edges_pull_hot_boundary_toward_ambient() {
        let mut config = insulated_single_chamber_config(10, 1e-3, 4.0e-3, 8.0);
        config.boundary = BoundaryConditionSpec::robin(298.0, 150.0);
        let mut sim = Simulation::new(config).unwrap();

        // Heat the whole field 50 K above ambient, then apply one loss pass.
        for cell in sim.field.next_values_mut() {
            *cell = 348.0;
        }
        sim.field.commit_next();
        let mut op = BoundaryLossOp;
        sim.step_with_ops(&mut [&mut op as &mut dyn SimOp]);

        assert_lt!(sim.field.kelvin(0, 5), 348.0);
        assert_gt!(sim.field.kelvin(0, 5), 298.0);
        // Interior untouched (no face loss configured)
        assert_relative_eq!(sim.field.kelvin(5, 5), 348.0);
        assert_gt!(sim.ledger.conv_loss_j, 0.0);
    }

    #[test]
    fn fixed_edges_are_pinned_to_ambient() {
        let mut config = insulated_single_chamber_config(10, 1e-3, 4.0e-3, 8.0);
        config.boundary = BoundaryConditionSpec::fixed(298.0);
        let mut sim = Simulation::new(config).unwrap();

        for cell in sim.field.next_values_mut() {
            *cell = 348.0;
        }
        sim.field.commit_next();
        let mut op = BoundaryLossOp;
        sim.step_with_ops(&mut [&mut op as &mut dyn SimOp]);

        assert_relative_eq!(sim.field.kelvin(0, 0), 298.0);
        assert_relative_eq!(sim.field.kelvin(9, 4), 298.0);
        assert_relative_eq!(sim.field.kelvin(5, 5), 348.0);
    }

    #[test]
    fn face_loss_drains_every_cell_and_books_the_energy() {
        let mut config = insulated_single_chamber_config(8, 1e-3, 4.0e-3, 8.0);
        config.boundary.face_h_w_m2_k = 150.0;
        let mut sim = Simulation::new(config).unwrap();
        let rho_cp = sim.props.volumetric_heat_capacity_j_m3_k();
        let cell_volume = sim.cell_volume_m3();

        for cell in sim.field.next_values_mut() {
            *cell = 308.0;
        }
        sim.field.commit_next();
        let mut op = BoundaryLossOp;
        sim.step_with_ops(&mut [&mut op as &mut dyn SimOp]);

        let after = sim.field.kelvin(3, 3);
        assert_lt!(after, 308.0);
        let expected_loss =
            (308.0 - after) * rho_cp * cell_volume * sim.field.cell_count() as f64;
        assert_relative_eq!(sim.ledger.conv_loss_j, expected_loss, max_relative = 1e-9);
    }
}
