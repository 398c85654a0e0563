use serde::Serialize;

use crate::config::RunConfig;
use crate::errors::SimError;
use crate::metrics::MetricsRecord;
use crate::sim::simulation::{RunOutcome, Simulation};

/// Chamber-diameter sweep under one shared configuration.
#[derive(Debug, Clone)]
pub struct DiameterSweepConfig {
    /// Single-chamber run reused for every diameter.
    pub template: RunConfig,
    pub diameters_m: Vec<f64>,
    /// Slack allowed before a drop in global efficiency across increasing
    /// diameters is reported as a monotonicity violation.
    pub monotonic_tol: f64,
}

/// One sweep entry; a failed run keeps its error instead of aborting the
/// remaining diameters.
#[derive(Debug)]
pub struct DiameterRun {
    pub diameter_m: f64,
    pub outcome: Result<RunOutcome, SimError>,
}

#[derive(Debug)]
pub struct DiameterSweepOutcome {
    pub runs: Vec<DiameterRun>,
    /// Human-readable diagnostics where global efficiency dropped between
    /// consecutive diameters beyond the configured tolerance.
    pub monotonic_violations: Vec<String>,
}

#[derive(Serialize)]
struct SweepParams<'a> {
    diameters_m: &'a [f64],
    monotonic_tol: f64,
    template: &'a RunConfig,
}

impl DiameterSweepOutcome {
    pub fn to_metrics_record(&self, sim_id: &str, config: &DiameterSweepConfig) -> MetricsRecord {
        let params = serde_json::to_value(SweepParams {
            diameters_m: &config.diameters_m,
            monotonic_tol: config.monotonic_tol,
            template: &config.template,
        })
        .unwrap_or(serde_json::Value::Null);
        let mut record = MetricsRecord::new(sim_id, params);
        record.seed = config.template.seed;
        for run in &self.runs {
            let suffix = format!("d_{:.1}mm", run.diameter_m * 1e3);
            match &run.outcome {
                Ok(outcome) => {
                    let mut put = |key: &str, value: f64| {
                        if value.is_finite() {
                            record.insert(&format!("{}_{}", key, suffix), value);
                        }
                    };
                    put("global_efficiency", outcome.metric.global_efficiency);
                    put("local_efficiency", outcome.metric.local_efficiency);
                    put("peak_t_k", outcome.metric.peak_t_k);
                    put("sim_time_s", outcome.sim_time_s);
                }
                Err(error) => {
                    record.warn(format!(
                        "diameter {:.1} mm failed: {}",
                        run.diameter_m * 1e3,
                        error
                    ));
                }
            }
        }
        for violation in &self.monotonic_violations {
            record.warn(violation.clone());
        }
        record
    }
}

/// Run every diameter of the sweep, attaching per-run failures instead of
/// aborting, then diff consecutive global efficiencies for the monotonicity
/// diagnostic.
pub fn run_diameter_sweep(config: &DiameterSweepConfig) -> Result<DiameterSweepOutcome, SimError> {
    if config.template.chambers.len() != 1 {
        return Err(SimError::InvalidConfiguration(
            "diameter sweep template must hold exactly one chamber".to_string(),
        ));
    }
    if config.diameters_m.is_empty() {
        return Err(SimError::InvalidConfiguration(
            "diameter sweep needs at least one diameter".to_string(),
        ));
    }

    let mut runs = Vec::with_capacity(config.diameters_m.len());
    for &diameter_m in &config.diameters_m {
        let mut run_config = config.template.clone();
        run_config.chambers[0].diameter_m = diameter_m;
        let outcome = Simulation::new(run_config).and_then(|mut sim| sim.run());
        runs.push(DiameterRun { diameter_m, outcome });
    }

    let mut monotonic_violations = Vec::new();
    let successes: Vec<(f64, f64)> = runs
        .iter()
        .filter_map(|run| {
            run.outcome
                .as_ref()
                .ok()
                .map(|o| (run.diameter_m, o.metric.global_efficiency))
        })
        .filter(|(_, eff)| eff.is_finite())
        .collect();
    for pair in successes.windows(2) {
        let (d_prev, eff_prev) = pair[0];
        let (d_next, eff_next) = pair[1];
        if eff_next + config.monotonic_tol < eff_prev {
            monotonic_violations.push(format!(
                "global efficiency dropped from {:.4} at {:.1} mm to {:.4} at {:.1} mm",
                eff_prev,
                d_prev * 1e3,
                eff_next,
                d_next * 1e3
            ));
        }
    }

    Ok(DiameterSweepOutcome { runs, monotonic_violations })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::insulated_single_chamber_config;

    fn sweep_config() -> DiameterSweepConfig {
        let mut template = insulated_single_chamber_config(40, 1e-3, 4.0e-3, 2.0);
        template.max_steps = 60;
        DiameterSweepConfig {
            template,
            diameters_m: vec![4.0e-3, 8.0e-3],
            monotonic_tol: 0.02,
        }
    }

    #[test]
    fn sweep_runs_every_diameter() {
        let outcome = run_diameter_sweep(&sweep_config()).unwrap();
        assert_eq!(outcome.runs.len(), 2);
        assert!(outcome.runs.iter().all(|r| r.outcome.is_ok()));
    }

    #[test]
    fn bad_diameter_attaches_error_without_aborting() {
        let mut config = sweep_config();
        config.diameters_m = vec![-1.0, 4.0e-3];
        let outcome = run_diameter_sweep(&config).unwrap();
        assert!(outcome.runs[0].outcome.is_err());
        assert!(outcome.runs[1].outcome.is_ok());
    }

    #[test]
    fn record_collects_per_diameter_metrics_and_warnings() {
        let mut config = sweep_config();
        config.diameters_m = vec![4.0e-3, -1.0];
        let outcome = run_diameter_sweep(&config).unwrap();
        let record = outcome.to_metrics_record("SIM-HT-CONJ", &config);
        assert!(record.get("global_efficiency_d_4.0mm").is_some());
        assert!(!record.warnings.is_empty());
    }
}
