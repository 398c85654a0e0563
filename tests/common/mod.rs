//! Shared run builders for integration tests.

use chamber_heat_rust::boundary::BoundaryConditionSpec;
use chamber_heat_rust::chamber::ChamberSource;
use chamber_heat_rust::config::RunConfig;
use chamber_heat_rust::material::{MaterialKind, MaterialSpec};

pub const AMBIENT_K: f64 = 298.0;

/// Square insulated water slab, single centered constant-power chamber.
pub fn insulated_water(n: usize, dx_m: f64, diameter_m: f64, power_w: f64) -> RunConfig {
    let domain = n as f64 * dx_m;
    RunConfig {
        nx: n,
        ny: n,
        dx_m,
        dy_m: dx_m,
        thickness_m: 5.0e-3,
        material: MaterialSpec::Named(MaterialKind::Water),
        chambers: vec![ChamberSource::constant(
            domain / 2.0,
            domain / 2.0,
            diameter_m,
            power_w,
        )],
        boundary: BoundaryConditionSpec::insulated(AMBIENT_K),
        dt_s: None,
        max_steps: 500,
        max_sim_time_s: 1.0e12,
        quasi_steady_k_per_s: None,
        peak_ceiling_k: None,
        save_interval: 50,
        seed: None,
    }
}
