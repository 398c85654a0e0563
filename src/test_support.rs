//! Shared builders for unit tests.

use crate::boundary::BoundaryConditionSpec;
use crate::chamber::ChamberSource;
use crate::config::RunConfig;
use crate::constants::AMBIENT_LAB_K;
use crate::material::{MaterialKind, MaterialSpec};

/// Square insulated water slab with a single constant-power chamber at the
/// domain center. `n` cells per side at spacing `dx_m`.
pub fn insulated_single_chamber_config(
    n: usize,
    dx_m: f64,
    diameter_m: f64,
    power_w: f64,
) -> RunConfig {
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
        boundary: BoundaryConditionSpec::insulated(AMBIENT_LAB_K),
        dt_s: None,
        max_steps: 200,
        max_sim_time_s: 1800.0,
        quasi_steady_k_per_s: None,
        peak_ceiling_k: None,
        save_interval: 50,
        seed: None,
    }
}
