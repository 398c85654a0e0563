use serde::{Deserialize, Serialize};

use crate::errors::SimError;

/// Thermal condition at the four domain edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EdgeCondition {
    /// Edge cells are pinned to ambient after every step.
    FixedTemperature,
    /// Robin convective loss: edge cells relax toward ambient with
    /// dT = -h dt / (rho cp dx) (T - T_inf) from the lumped node balance.
    Robin { h_w_m2_k: f64 },
    /// Zero-flux edges; nothing leaves the domain.
    Insulated,
}

/// Latent-heat band for phase-change material (enthalpy method).
///
/// Energy deposited while a cell sits inside [t_melt_low_k, t_melt_high_k]
/// fills a per-cell latent accumulator instead of raising temperature; the
/// rise resumes once the accumulator holds `latent_heat * rho * cell_volume`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LatentBand {
    pub t_melt_low_k: f64,
    pub t_melt_high_k: f64,
    pub latent_heat_j_per_kg: f64,
}

impl LatentBand {
    pub fn validate(&self) -> Result<(), SimError> {
        if self.t_melt_low_k >= self.t_melt_high_k {
            return Err(SimError::InvalidConfiguration(format!(
                "latent band is empty: [{}, {}] K",
                self.t_melt_low_k, self.t_melt_high_k
            )));
        }
        if self.latent_heat_j_per_kg <= 0.0 {
            return Err(SimError::InvalidConfiguration(
                "latent heat must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Boundary specification for a run: ambient sink temperature, edge
/// condition, optional slab-face convection (applied to every cell over the
/// slab thickness) and optional latent-heat band.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundaryConditionSpec {
    pub ambient_k: f64,
    pub edge: EdgeCondition,
    /// Convective loss from the slab face, W/(m^2 K); 0 disables it.
    #[serde(default)]
    pub face_h_w_m2_k: f64,
    #[serde(default)]
    pub latent_band: Option<LatentBand>,
}

impl BoundaryConditionSpec {
    pub fn insulated(ambient_k: f64) -> Self {
        BoundaryConditionSpec {
            ambient_k,
            edge: EdgeCondition::Insulated,
            face_h_w_m2_k: 0.0,
            latent_band: None,
        }
    }

    pub fn robin(ambient_k: f64, h_w_m2_k: f64) -> Self {
        BoundaryConditionSpec {
            ambient_k,
            edge: EdgeCondition::Robin { h_w_m2_k },
            face_h_w_m2_k: 0.0,
            latent_band: None,
        }
    }

    pub fn fixed(ambient_k: f64) -> Self {
        BoundaryConditionSpec {
            ambient_k,
            edge: EdgeCondition::FixedTemperature,
            face_h_w_m2_k: 0.0,
            latent_band: None,
        }
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if self.ambient_k <= 0.0 {
            return Err(SimError::InvalidConfiguration(format!(
                "ambient temperature must be positive kelvin, got {}",
                self.ambient_k
            )));
        }
        if let EdgeCondition::Robin { h_w_m2_k } = self.edge {
            if h_w_m2_k < 0.0 {
                return Err(SimError::InvalidConfiguration(
                    "convective coefficient h must be non-negative".to_string(),
                ));
            }
        }
        if self.face_h_w_m2_k < 0.0 {
            return Err(SimError::InvalidConfiguration(
                "face convective coefficient must be non-negative".to_string(),
            ));
        }
        if let Some(band) = &self.latent_band {
            band.validate()?;
        }
        Ok(())
    }
}
