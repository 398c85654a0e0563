use serde::{Deserialize, Serialize};

use crate::chamber::ChamberSource;
use crate::config::RunConfig;
use crate::constants::OVERLAP_GAIN_THRESHOLD;
use crate::errors::SimError;
use crate::grid_field::GridField;
use crate::metrics::MetricsRecord;
use crate::sim::simulation::Simulation;

/// How the chamber-array response is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuperpositionMode {
    /// Full coupled run with all chambers active.
    CoupledFull,
    /// Sum of the isolated single-chamber response sampled at neighbor
    /// offsets. Exact for pure linear diffusion, approximate otherwise; the
    /// output record is labeled accordingly.
    LinearSuperposition,
}

impl SuperpositionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuperpositionMode::CoupledFull => "coupled_full",
            SuperpositionMode::LinearSuperposition => "linear_superposition",
        }
    }
}

/// Spacing sweep over an n x n chamber array at several pitch-to-diameter
/// ratios, against the isolated single-chamber baseline.
#[derive(Debug, Clone)]
pub struct SpacingSweepConfig {
    /// Single-chamber run that defines the baseline. Must hold exactly one
    /// chamber; its diameter and power are reused for every array member.
    pub template: RunConfig,
    pub pitches_pd: Vec<f64>,
    pub n_side: usize,
    pub mode: SuperpositionMode,
}

/// Overlap metrics for one pitch ratio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PitchResult {
    pub pd: f64,
    pub mean_peak_rise_k: f64,
    /// Mean center rise / isolated center rise.
    pub efficiency_per_chamber: f64,
    /// max(0, efficiency - 1): constructive neighbor preheating.
    pub overlap_gain: f64,
    /// max(0, 1 - efficiency): destructive competition for the sink.
    pub overlap_penalty: f64,
    /// Per-pitch failure; the sweep continues past it.
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpacingSweepOutcome {
    pub mode: SuperpositionMode,
    pub isolated_peak_rise_k: f64,
    pub results: Vec<PitchResult>,
    /// Largest P/D whose overlap gain still exceeds the 5% threshold: the
    /// spacing beyond which packing chambers closer stops paying off.
    pub threshold_pd: Option<f64>,
}

impl SpacingSweepOutcome {
    pub fn to_metrics_record(&self, sim_id: &str, config: &SpacingSweepConfig) -> MetricsRecord {
        let params = serde_json::json!({
            "pitches_pd": config.pitches_pd,
            "n_side": config.n_side,
            "mode": self.mode.as_str(),
            "template": serde_json::to_value(&config.template).unwrap_or(serde_json::Value::Null),
        });
        let mut record = MetricsRecord::new(sim_id, params);
        record.insert("isolated_peak_rise_k", self.isolated_peak_rise_k);
        for result in &self.results {
            let suffix = format!("pd_{:.2}", result.pd);
            if let Some(error) = &result.error {
                record.warn(format!("P/D {:.2} failed: {}", result.pd, error));
                continue;
            }
            record.insert(&format!("efficiency_per_chamber_{}", suffix), result.efficiency_per_chamber);
            record.insert(&format!("overlap_gain_{}", suffix), result.overlap_gain);
            record.insert(&format!("overlap_penalty_{}", suffix), result.overlap_penalty);
        }
        if let Some(pd) = self.threshold_pd {
            record.insert("threshold_pd", pd);
        }
        if self.mode == SuperpositionMode::LinearSuperposition {
            record.insert("superposition_approx", 1.0);
            record.notes =
                "array response approximated by sampling the isolated-chamber field at neighbor offsets"
                    .to_string();
        }
        record
    }
}

fn array_centers(template: &RunConfig, pitch_m: f64, n_side: usize) -> Vec<(f64, f64)> {
    let cx = template.domain_x_m() / 2.0;
    let cy = template.domain_y_m() / 2.0;
    let start = -((n_side as f64 - 1.0) / 2.0) * pitch_m;
    let mut centers = Vec::with_capacity(n_side * n_side);
    for i in 0..n_side {
        for j in 0..n_side {
            centers.push((cx + start + i as f64 * pitch_m, cy + start + j as f64 * pitch_m));
        }
    }
    centers
}

/// Rise of the isolated response at a cell offset from its own center; zero
/// outside the domain (the response has decayed to ambient there).
fn sampled_rise(
    field: &GridField,
    center_i: usize,
    center_j: usize,
    di: i64,
    dj: i64,
    ambient_k: f64,
) -> f64 {
    let i = center_i as i64 + di;
    let j = center_j as i64 + dj;
    if i < 0 || j < 0 || i >= field.nx as i64 || j >= field.ny as i64 {
        return 0.0;
    }
    (field.kelvin(i as usize, j as usize) - ambient_k).max(0.0)
}

fn coupled_mean_rise(template: &RunConfig, centers: &[(f64, f64)]) -> Result<f64, SimError> {
    let mut config = template.clone();
    let base = config.chambers[0].clone();
    config.chambers = centers.iter().map(|&(x, y)| chamber_at(&base, x, y)).collect();
    let mut sim = Simulation::new(config)?;
    sim.run()?;
    let ambient = sim.boundary.ambient_k;
    let total: f64 = sim
        .footprints
        .iter()
        .map(|fp| (sim.field.current_values()[fp.center_cell] - ambient).max(0.0))
        .sum();
    Ok(total / sim.footprints.len() as f64)
}

/// Run the spacing sweep: isolated baseline first, then one array evaluation
/// per pitch ratio. Per-pitch failures attach to the result and do not abort
/// the sweep.
pub fn run_spacing_sweep(config: &SpacingSweepConfig) -> Result<SpacingSweepOutcome, SimError> {
    if config.template.chambers.len() != 1 {
        return Err(SimError::InvalidConfiguration(
            "spacing sweep template must hold exactly one chamber".to_string(),
        ));
    }
    if config.n_side < 2 {
        return Err(SimError::InvalidConfiguration(
            "spacing sweep needs at least a 2x2 array".to_string(),
        ));
    }
    if config.pitches_pd.is_empty() || config.pitches_pd.iter().any(|&p| p <= 0.0) {
        return Err(SimError::InvalidConfiguration(
            "pitch ratios must be positive and non-empty".to_string(),
        ));
    }

    // All runs must cover the same simulated interval for the baseline
    // normalization to mean anything, so early-stop conditions are disabled.
    let mut template = config.template.clone();
    template.peak_ceiling_k = None;
    template.quasi_steady_k_per_s = None;

    let mut iso_sim = Simulation::new(template.clone())?;
    iso_sim.run()?;
    let ambient = iso_sim.boundary.ambient_k;
    let iso_footprint = &iso_sim.footprints[0];
    let iso_rise =
        (iso_sim.field.current_values()[iso_footprint.center_cell] - ambient).max(0.0);
    if iso_rise <= 0.0 {
        return Err(SimError::InvalidConfiguration(
            "isolated baseline produced no temperature rise; check chamber power".to_string(),
        ));
    }

    let diameter_m = template.chambers[0].diameter_m;
    let iso_center_i = iso_footprint.center_cell / iso_sim.field.ny;
    let iso_center_j = iso_footprint.center_cell % iso_sim.field.ny;

    let mut results = Vec::with_capacity(config.pitches_pd.len());
    for &pd in &config.pitches_pd {
        let pitch_m = pd * diameter_m;
        let centers = array_centers(&template, pitch_m, config.n_side);

        let mean_rise = match config.mode {
            SuperpositionMode::CoupledFull => coupled_mean_rise(&template, &centers),
            SuperpositionMode::LinearSuperposition => {
                // Rise at each target center is the sum of the isolated
                // response sampled at every source's offset from the target.
                let mut total = 0.0;
                for &(tx, ty) in &centers {
                    let mut rise = 0.0;
                    for &(sx, sy) in &centers {
                        let di = ((tx - sx) / iso_sim.field.dx_m).round() as i64;
                        let dj = ((ty - sy) / iso_sim.field.dy_m).round() as i64;
                        rise += sampled_rise(
                            &iso_sim.field,
                            iso_center_i,
                            iso_center_j,
                            di,
                            dj,
                            ambient,
                        );
                    }
                    total += rise;
                }
                Ok(total / centers.len() as f64)
            }
        };

        match mean_rise {
            Ok(mean_peak_rise_k) => {
                let efficiency = mean_peak_rise_k / iso_rise;
                results.push(PitchResult {
                    pd,
                    mean_peak_rise_k,
                    efficiency_per_chamber: efficiency,
                    overlap_gain: (efficiency - 1.0).max(0.0),
                    overlap_penalty: (1.0 - efficiency).max(0.0),
                    error: None,
                });
            }
            Err(error) => results.push(PitchResult {
                pd,
                mean_peak_rise_k: 0.0,
                efficiency_per_chamber: 0.0,
                overlap_gain: 0.0,
                overlap_penalty: 0.0,
                error: Some(error.to_string()),
            }),
        }
    }

    // Largest spacing whose gain still clears the threshold. Scanning from
    // the widest pitch downward resolves ties toward the larger spacing.
    let mut ordered: Vec<&PitchResult> = results.iter().filter(|r| r.error.is_none()).collect();
    ordered.sort_by(|a, b| b.pd.total_cmp(&a.pd));
    let threshold_pd = ordered
        .iter()
        .find(|r| r.overlap_gain > OVERLAP_GAIN_THRESHOLD)
        .map(|r| r.pd);

    Ok(SpacingSweepOutcome {
        mode: config.mode,
        isolated_peak_rise_k: iso_rise,
        results,
        threshold_pd,
    })
}

/// Rebuild the template's chamber at a new center.
pub fn chamber_at(base: &ChamberSource, x_m: f64, y_m: f64) -> ChamberSource {
    let mut chamber = base.clone();
    chamber.center_x_m = x_m;
    chamber.center_y_m = y_m;
    chamber
}
