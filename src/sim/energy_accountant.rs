use serde::{Deserialize, Serialize};

use crate::chamber::ChamberSource;
use crate::constants::{EFFICIENCY_TOLERANCE, LOCAL_ANNULUS_FACTOR, PEAK_FRACTION_FOR_RISE_TIME};
use crate::grid_field::GridField;
use crate::material::MaterialProps;
use crate::math_utils::trapezoid;
use crate::sim::simulation::HistorySample;

/// One electrical measurement point. Power is volts * amps.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PowerSample {
    pub t_s: f64,
    pub volts: f64,
    pub amps: f64,
}

/// Time series of electrical input measurements. Input energy is the
/// trapezoidal integral of V*I over the log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElectricalLog {
    pub samples: Vec<PowerSample>,
}

impl ElectricalLog {
    /// Synthetic log for a constant electrical power over [0, duration].
    pub fn from_constant_power(power_w: f64, duration_s: f64) -> Self {
        ElectricalLog {
            samples: vec![
                PowerSample { t_s: 0.0, volts: power_w, amps: 1.0 },
                PowerSample { t_s: duration_s, volts: power_w, amps: 1.0 },
            ],
        }
    }

    pub fn energy_j(&self) -> f64 {
        let points: Vec<(f64, f64)> = self
            .samples
            .iter()
            .map(|s| (s.t_s, s.volts * s.amps))
            .collect();
        trapezoid(&points)
    }
}

/// Plausibility classification of a run's energy bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultFlag {
    Plausible,
    /// Efficiency is undefined (zero input energy).
    Undefined,
    /// Bookkeeping violates physical bounds, or the run hit its ceiling.
    Implausible,
}

impl ResultFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultFlag::Plausible => "plausible",
            ResultFlag::Undefined => "undefined",
            ResultFlag::Implausible => "implausible",
        }
    }
}

/// Derived efficiency metrics for one run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EfficiencyMetric {
    /// Stored energy over the whole domain / electrical input.
    pub global_efficiency: f64,
    /// Stored energy within the chamber annulus / electrical input.
    pub local_efficiency: f64,
    /// Stored / (stored + convective losses).
    pub retained_efficiency: f64,
    pub peak_t_k: f64,
    /// Time for the peak rise to reach 90% of its final value.
    pub time_to_90pct_s: Option<f64>,
}

/// Energy bookkeeping over a run: stored-energy sums relative to ambient,
/// efficiency ratios and their plausibility classification.
///
/// The local region is a disc of 1.5x the primary chamber radius around its
/// center, the "thermally useful" neighborhood of the chamber.
#[derive(Debug, Clone)]
pub struct EnergyAccountant {
    rho_cp_j_m3_k: f64,
    cell_volume_m3: f64,
    ambient_k: f64,
    local_cells: Vec<usize>,
}

impl EnergyAccountant {
    pub fn new(
        field: &GridField,
        props: &MaterialProps,
        thickness_m: f64,
        ambient_k: f64,
        primary: &ChamberSource,
    ) -> Self {
        let local_cells = field.cells_within_radius(
            primary.center_x_m,
            primary.center_y_m,
            LOCAL_ANNULUS_FACTOR * primary.radius_m(),
        );
        EnergyAccountant {
            rho_cp_j_m3_k: props.volumetric_heat_capacity_j_m3_k(),
            cell_volume_m3: field.dx_m * field.dy_m * thickness_m,
            ambient_k,
            local_cells,
        }
    }

    pub fn local_cell_count(&self) -> usize {
        self.local_cells.len()
    }

    /// Sensible energy stored above ambient over the whole field. Cells below
    /// ambient contribute zero; stored energy is a deficit-free sum.
    pub fn stored_global_j(&self, field: &GridField) -> f64 {
        field
            .current_values()
            .iter()
            .map(|&t| (t - self.ambient_k).max(0.0))
            .sum::<f64>()
            * self.rho_cp_j_m3_k
            * self.cell_volume_m3
    }

    /// Sensible energy stored above ambient within the local annulus.
    pub fn stored_local_j(&self, field: &GridField) -> f64 {
        let values = field.current_values();
        self.local_cells
            .iter()
            .map(|&cell| (values[cell] - self.ambient_k).max(0.0))
            .sum::<f64>()
            * self.rho_cp_j_m3_k
            * self.cell_volume_m3
    }

    /// Stored / input ratio; NaN when no energy was put in.
    pub fn efficiency(stored_j: f64, input_j: f64) -> f64 {
        if input_j <= 0.0 {
            f64::NAN
        } else {
            stored_j / input_j
        }
    }

    /// Stored / (stored + losses); NaN when both are zero.
    pub fn retained_efficiency(stored_j: f64, loss_j: f64) -> f64 {
        let total = stored_j + loss_j;
        if total <= 0.0 { f64::NAN } else { stored_j / total }
    }

    /// Classify the run's bookkeeping. Efficiencies above 1 (beyond
    /// tolerance) or a local fraction above the global one are implausible;
    /// zero input makes the result undefined rather than an error.
    pub fn classify(global_eff: f64, local_eff: f64) -> (ResultFlag, Vec<String>) {
        let mut warnings = Vec::new();
        if global_eff.is_nan() || local_eff.is_nan() {
            warnings.push("efficiency undefined: no input energy".to_string());
            return (ResultFlag::Undefined, warnings);
        }
        let mut flag = ResultFlag::Plausible;
        if global_eff > 1.0 + EFFICIENCY_TOLERANCE {
            warnings.push(format!(
                "global efficiency {:.4} exceeds unity beyond tolerance",
                global_eff
            ));
            flag = ResultFlag::Implausible;
        }
        if local_eff > global_eff + EFFICIENCY_TOLERANCE {
            warnings.push(format!(
                "local efficiency {:.4} exceeds global efficiency {:.4}",
                local_eff, global_eff
            ));
            flag = ResultFlag::Implausible;
        }
        (flag, warnings)
    }

    /// First history time at which the peak rise reaches 90% of its final
    /// value. None when the run never rose above ambient.
    pub fn time_to_90pct(history: &[HistorySample], ambient_k: f64) -> Option<f64> {
        let final_rise = history.last().map(|s| s.peak_k - ambient_k)?;
        if final_rise <= 0.0 {
            return None;
        }
        let target = PEAK_FRACTION_FOR_RISE_TIME * final_rise;
        history
            .iter()
            .find(|s| s.peak_k - ambient_k >= target)
            .map(|s| s.time_s)
    }
}
