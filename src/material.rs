// src/material.rs - Material system with thermal and physical properties

use crate::errors::SimError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaterialKind {
    Water,
    Hydrogel,
    ChitinComposite,
    ParaffinPcm,
}

impl MaterialKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaterialKind::Water => "water",
            MaterialKind::Hydrogel => "hydrogel",
            MaterialKind::ChitinComposite => "chitin_composite",
            MaterialKind::ParaffinPcm => "paraffin_pcm",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "water" => Some(MaterialKind::Water),
            "hydrogel" => Some(MaterialKind::Hydrogel),
            "chitin_composite" => Some(MaterialKind::ChitinComposite),
            "paraffin_pcm" => Some(MaterialKind::ParaffinPcm),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MaterialProfile {
    pub kind: MaterialKind,
    pub density_kg_m3: f64,
    pub specific_heat_j_per_kg_k: f64,
    pub thermal_conductivity_w_m_k: f64,
    /// Melting band for phase-change materials; None for single-phase media.
    pub melt_band_k: Option<(f64, f64)>,
    pub latent_heat_fusion_j_per_kg: Option<f64>,
}

impl MaterialProfile {
    /// alpha = k / (rho * cp), m^2/s
    pub fn thermal_diffusivity_m2_s(&self) -> f64 {
        self.thermal_conductivity_w_m_k / (self.density_kg_m3 * self.specific_heat_j_per_kg_k)
    }

    /// rho * cp, J/(m^3 K)
    pub fn volumetric_heat_capacity_j_m3_k(&self) -> f64 {
        self.density_kg_m3 * self.specific_heat_j_per_kg_k
    }
}

pub static MATERIAL_PROFILES: Lazy<HashMap<MaterialKind, MaterialProfile>> = Lazy::new(|| {
    use MaterialKind::*;
    let mut m = HashMap::new();

    m.insert(Water, MaterialProfile {
        kind: Water,
        density_kg_m3: 1000.0,
        specific_heat_j_per_kg_k: 4180.0,
        thermal_conductivity_w_m_k: 0.6,
        melt_band_k: None,
        latent_heat_fusion_j_per_kg: None,
    });

    m.insert(Hydrogel, MaterialProfile {
        kind: Hydrogel,
        density_kg_m3: 1050.0,
        specific_heat_j_per_kg_k: 3800.0,
        thermal_conductivity_w_m_k: 0.55,
        melt_band_k: None,
        latent_heat_fusion_j_per_kg: None,
    });

    m.insert(ChitinComposite, MaterialProfile {
        kind: ChitinComposite,
        density_kg_m3: 1400.0,
        specific_heat_j_per_kg_k: 1500.0,
        thermal_conductivity_w_m_k: 0.45,
        melt_band_k: None,
        latent_heat_fusion_j_per_kg: None,
    });

    m.insert(ParaffinPcm, MaterialProfile {
        kind: ParaffinPcm,
        density_kg_m3: 900.0,
        specific_heat_j_per_kg_k: 2100.0,
        thermal_conductivity_w_m_k: 0.25,
        melt_band_k: Some((305.0, 308.0)),
        latent_heat_fusion_j_per_kg: Some(2.0e5),
    });

    m
});

pub fn get_profile(kind: MaterialKind) -> Option<&'static MaterialProfile> {
    MATERIAL_PROFILES.get(&kind)
}

/// Material selection for a run: a named profile or explicit properties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MaterialSpec {
    Named(MaterialKind),
    Custom {
        density_kg_m3: f64,
        specific_heat_j_per_kg_k: f64,
        thermal_conductivity_w_m_k: f64,
    },
}

/// Resolved properties actually used by a run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MaterialProps {
    pub density_kg_m3: f64,
    pub specific_heat_j_per_kg_k: f64,
    pub thermal_conductivity_w_m_k: f64,
}

impl MaterialProps {
    pub fn thermal_diffusivity_m2_s(&self) -> f64 {
        self.thermal_conductivity_w_m_k / (self.density_kg_m3 * self.specific_heat_j_per_kg_k)
    }

    pub fn volumetric_heat_capacity_j_m3_k(&self) -> f64 {
        self.density_kg_m3 * self.specific_heat_j_per_kg_k
    }
}

impl MaterialSpec {
    pub fn resolve(&self) -> Result<MaterialProps, SimError> {
        let props = match self {
            MaterialSpec::Named(kind) => {
                let p = get_profile(*kind).ok_or_else(|| {
                    SimError::InvalidConfiguration(format!("unknown material {:?}", kind))
                })?;
                MaterialProps {
                    density_kg_m3: p.density_kg_m3,
                    specific_heat_j_per_kg_k: p.specific_heat_j_per_kg_k,
                    thermal_conductivity_w_m_k: p.thermal_conductivity_w_m_k,
                }
            }
            MaterialSpec::Custom {
                density_kg_m3,
                specific_heat_j_per_kg_k,
                thermal_conductivity_w_m_k,
            } => MaterialProps {
                density_kg_m3: *density_kg_m3,
                specific_heat_j_per_kg_k: *specific_heat_j_per_kg_k,
                thermal_conductivity_w_m_k: *thermal_conductivity_w_m_k,
            },
        };
        if props.density_kg_m3 <= 0.0
            || props.specific_heat_j_per_kg_k <= 0.0
            || props.thermal_conductivity_w_m_k <= 0.0
        {
            return Err(SimError::InvalidConfiguration(
                "material properties must all be positive".to_string(),
            ));
        }
        Ok(props)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn water_diffusivity_matches_handbook_value() {
        let water = get_profile(MaterialKind::Water).unwrap();
        // k / (rho cp) = 0.6 / 4.18e6
        assert_relative_eq!(water.thermal_diffusivity_m2_s(), 1.435e-7, max_relative = 0.01);
    }

    #[test]
    fn custom_spec_rejects_nonpositive_properties() {
        let spec = MaterialSpec::Custom {
            density_kg_m3: -1.0,
            specific_heat_j_per_kg_k: 4180.0,
            thermal_conductivity_w_m_k: 0.6,
        };
        assert!(spec.resolve().is_err());
    }

    #[test]
    fn named_specs_resolve_for_all_profiles() {
        for kind in [
            MaterialKind::Water,
            MaterialKind::Hydrogel,
            MaterialKind::ChitinComposite,
            MaterialKind::ParaffinPcm,
        ] {
            let props = MaterialSpec::Named(kind).resolve().unwrap();
            assert!(props.thermal_diffusivity_m2_s() > 0.0);
        }
    }
}
