use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::boundary::BoundaryConditionSpec;
use crate::chamber::{ChamberFootprint, ChamberSource};
use crate::constants::{
    AMBIENT_LAB_K, DEFAULT_CONVECTIVE_H_W_M2_K, DEFAULT_DOMAIN_M, DEFAULT_PEAK_CEILING_K,
    DEFAULT_SLAB_THICKNESS_M, MAX_SIM_TIME_S, STABILITY_SAFETY_FACTOR,
};
use crate::errors::SimError;
use crate::grid_field::GridField;
use crate::material::{MaterialKind, MaterialProps, MaterialSpec};

/// Full parameter set for one simulation run.
///
/// Runs never consult process-wide state: everything a run needs is carried
/// here, so independent runs stay independently testable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub nx: usize,
    pub ny: usize,
    pub dx_m: f64,
    pub dy_m: f64,
    /// Slab thickness used for volumetric source strength and energy sums.
    pub thickness_m: f64,
    pub material: MaterialSpec,
    pub chambers: Vec<ChamberSource>,
    pub boundary: BoundaryConditionSpec,
    /// Explicit time step; None selects 96% of the stability bound.
    #[serde(default)]
    pub dt_s: Option<f64>,
    pub max_steps: usize,
    #[serde(default = "default_max_sim_time")]
    pub max_sim_time_s: f64,
    /// Quasi-steady termination threshold on max |dT/dt|, K/s.
    #[serde(default)]
    pub quasi_steady_k_per_s: Option<f64>,
    /// Early-stop ceiling on peak temperature; reaching it also flags the
    /// run outcome as implausible.
    #[serde(default = "default_peak_ceiling")]
    pub peak_ceiling_k: Option<f64>,
    /// History sampling cadence in steps.
    pub save_interval: usize,
    /// Provenance seed recorded in output metrics (thermal runs themselves
    /// are deterministic).
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_max_sim_time() -> f64 {
    MAX_SIM_TIME_S
}

fn default_peak_ceiling() -> Option<f64> {
    Some(DEFAULT_PEAK_CEILING_K)
}

impl RunConfig {
    /// Bench default mirroring the conjugate-heat protocol: 80 mm water slab,
    /// 256x256 grid, one centered 4 mm chamber at 8 W, Robin edges at h=150.
    pub fn lab_default() -> Self {
        let grid = 256;
        let dx = DEFAULT_DOMAIN_M / grid as f64;
        RunConfig {
            nx: grid,
            ny: grid,
            dx_m: dx,
            dy_m: dx,
            thickness_m: DEFAULT_SLAB_THICKNESS_M,
            material: MaterialSpec::Named(MaterialKind::Water),
            chambers: vec![ChamberSource::constant(
                DEFAULT_DOMAIN_M / 2.0,
                DEFAULT_DOMAIN_M / 2.0,
                4.0e-3,
                8.0,
            )],
            boundary: BoundaryConditionSpec::robin(AMBIENT_LAB_K, DEFAULT_CONVECTIVE_H_W_M2_K),
            dt_s: None,
            max_steps: 3000,
            max_sim_time_s: MAX_SIM_TIME_S,
            quasi_steady_k_per_s: None,
            peak_ceiling_k: Some(DEFAULT_PEAK_CEILING_K),
            save_interval: 200,
            seed: None,
        }
    }

    pub fn domain_x_m(&self) -> f64 {
        self.nx as f64 * self.dx_m
    }

    pub fn domain_y_m(&self) -> f64 {
        self.ny as f64 * self.dy_m
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, SimError> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            SimError::InvalidConfiguration(format!(
                "failed to read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let config: RunConfig = serde_json::from_str(&raw)
            .map_err(|e| SimError::InvalidConfiguration(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn resolve_material(&self) -> Result<MaterialProps, SimError> {
        self.material.resolve()
    }

    /// Largest stable explicit time step for this grid and material.
    pub fn stability_limit_s(&self, props: &MaterialProps) -> f64 {
        let alpha = props.thermal_diffusivity_m2_s();
        1.0 / (2.0 * alpha * (1.0 / (self.dx_m * self.dx_m) + 1.0 / (self.dy_m * self.dy_m)))
    }

    /// Time step the run will use: the configured one (validated against the
    /// stability bound) or 96% of the bound.
    pub fn resolved_dt_s(&self, props: &MaterialProps) -> Result<f64, SimError> {
        let limit = self.stability_limit_s(props);
        match self.dt_s {
            Some(dt) => {
                if dt <= 0.0 {
                    return Err(SimError::InvalidConfiguration(
                        "dt must be positive".to_string(),
                    ));
                }
                if dt > limit {
                    return Err(SimError::InvalidTimestep { dt_s: dt, limit_s: limit });
                }
                Ok(dt)
            }
            None => Ok(STABILITY_SAFETY_FACTOR * limit),
        }
    }

    /// Fail-fast validation before any stepping begins.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.nx < 3 || self.ny < 3 {
            return Err(SimError::InvalidConfiguration(format!(
                "grid must be at least 3x3, got {}x{}",
                self.nx, self.ny
            )));
        }
        if self.dx_m <= 0.0 || self.dy_m <= 0.0 {
            return Err(SimError::InvalidConfiguration(
                "grid spacing must be positive".to_string(),
            ));
        }
        if self.thickness_m <= 0.0 {
            return Err(SimError::InvalidConfiguration(
                "slab thickness must be positive".to_string(),
            ));
        }
        if self.max_steps == 0 {
            return Err(SimError::InvalidConfiguration(
                "max_steps must be at least 1".to_string(),
            ));
        }
        if self.max_sim_time_s <= 0.0 {
            return Err(SimError::InvalidConfiguration(
                "max_sim_time_s must be positive".to_string(),
            ));
        }
        if self.save_interval == 0 {
            return Err(SimError::InvalidConfiguration(
                "save_interval must be at least 1".to_string(),
            ));
        }
        if let Some(q) = self.quasi_steady_k_per_s {
            if q <= 0.0 {
                return Err(SimError::InvalidConfiguration(
                    "quasi-steady threshold must be positive".to_string(),
                ));
            }
        }
        self.boundary.validate()?;
        if let Some(ceiling) = self.peak_ceiling_k {
            if ceiling <= self.boundary.ambient_k {
                return Err(SimError::InvalidConfiguration(format!(
                    "peak ceiling {} K must exceed ambient {} K",
                    ceiling, self.boundary.ambient_k
                )));
            }
        }
        if self.chambers.is_empty() {
            return Err(SimError::InvalidConfiguration(
                "at least one chamber source is required".to_string(),
            ));
        }
        let props = self.resolve_material()?;
        self.resolved_dt_s(&props)?;

        // Geometry check: every chamber must resolve to at least one cell.
        let probe = GridField::new(self.nx, self.ny, self.dx_m, self.dy_m, self.boundary.ambient_k);
        for chamber in &self.chambers {
            chamber.validate()?;
            ChamberFootprint::resolve(chamber, &probe, self.thickness_m)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lab_default_is_valid() {
        RunConfig::lab_default().validate().unwrap();
    }

    #[test]
    fn oversized_dt_fails_fast_with_invalid_timestep() {
        let mut config = RunConfig::lab_default();
        let props = config.resolve_material().unwrap();
        let limit = config.stability_limit_s(&props);
        config.dt_s = Some(limit * 2.0);
        match config.validate() {
            Err(SimError::InvalidTimestep { dt_s, limit_s }) => {
                assert!(dt_s > limit_s);
            }
            other => panic!("expected InvalidTimestep, got {:?}", other),
        }
    }

    #[test]
    fn dt_at_bound_is_accepted() {
        let mut config = RunConfig::lab_default();
        let props = config.resolve_material().unwrap();
        config.dt_s = Some(config.stability_limit_s(&props) * 0.5);
        config.validate().unwrap();
    }

    #[test]
    fn negative_chamber_diameter_rejected() {
        let mut config = RunConfig::lab_default();
        config.chambers[0].diameter_m = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_chamber_list_rejected() {
        let mut config = RunConfig::lab_default();
        config.chambers.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = RunConfig::lab_default();
        let json = serde_json::to_string(&config).unwrap();
        let back: RunConfig = serde_json::from_str(&json).unwrap();
        back.validate().unwrap();
        assert_eq!(back.nx, config.nx);
    }
}
