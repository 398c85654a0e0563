use std::time::Instant;

use colored::Colorize;
use serde::{Deserialize, Serialize};

use crate::boundary::BoundaryConditionSpec;
use crate::chamber::{ChamberFootprint, ChamberSource};
use crate::config::RunConfig;
use crate::errors::SimError;
use crate::grid_field::GridField;
use crate::material::MaterialProps;
use crate::metrics::MetricsRecord;
use crate::sim::energy_accountant::{EfficiencyMetric, ElectricalLog, EnergyAccountant, ResultFlag};
use crate::sim_op::{
    BoundaryLossOp, DiffusionOp, LatentBandOp, ProgressReportOp, SimOp, SourceDepositionOp,
};

/// Why a run terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    MaxSteps,
    MaxSimTime,
    /// max |dT/dt| fell below the configured threshold.
    QuasiSteady,
    /// Peak temperature reached the configured ceiling; the outcome is
    /// annotated as implausible.
    TemperatureCap,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::MaxSteps => "max_steps",
            StopReason::MaxSimTime => "max_sim_time",
            StopReason::QuasiSteady => "quasi_steady",
            StopReason::TemperatureCap => "temperature_cap",
        }
    }
}

/// One history point, sampled every `save_interval` steps.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HistorySample {
    pub time_s: f64,
    pub peak_k: f64,
    pub stored_global_j: f64,
    pub stored_local_j: f64,
}

/// Cumulative energy bookkeeping, maintained by the pipeline ops.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnergyLedger {
    /// Electrical energy deposited by all chambers, J.
    pub input_j: f64,
    /// Energy removed through edge and face convection, J.
    pub conv_loss_j: f64,
}

/// Wall-clock accounting per operator.
#[derive(Debug, Clone)]
pub struct OpTiming {
    pub name: String,
    pub total: std::time::Duration,
    pub calls: usize,
}

/// Final result of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    pub stop_reason: StopReason,
    pub steps: usize,
    pub sim_time_s: f64,
    pub dt_s: f64,
    pub metric: EfficiencyMetric,
    pub flag: ResultFlag,
    pub warnings: Vec<String>,
    pub input_j: f64,
    pub conv_loss_j: f64,
    pub stored_global_j: f64,
    pub stored_local_j: f64,
    pub latent_stored_j: f64,
    pub history: Vec<HistorySample>,
}

impl RunOutcome {
    /// Flatten into the metrics-record artifact. Undefined (NaN) efficiencies
    /// are omitted from the flat map (JSON has no NaN) and noted as warnings.
    pub fn to_metrics_record(&self, sim_id: &str, config: &RunConfig) -> MetricsRecord {
        let params = serde_json::to_value(config).unwrap_or(serde_json::Value::Null);
        let mut record = MetricsRecord::new(sim_id, params);
        record.seed = config.seed;
        let mut put = |record: &mut MetricsRecord, key: &str, value: f64| {
            if value.is_finite() {
                record.insert(key, value);
            } else {
                record.warn(format!("metric {} is undefined for this run", key));
            }
        };
        put(&mut record, "global_efficiency", self.metric.global_efficiency);
        put(&mut record, "local_efficiency", self.metric.local_efficiency);
        put(&mut record, "retained_efficiency", self.metric.retained_efficiency);
        record.insert("peak_t_k", self.metric.peak_t_k);
        if let Some(t90) = self.metric.time_to_90pct_s {
            record.insert("time_to_90pct_s", t90);
        }
        record.insert("input_j", self.input_j);
        record.insert("conv_loss_j", self.conv_loss_j);
        record.insert("stored_global_j", self.stored_global_j);
        record.insert("stored_local_j", self.stored_local_j);
        record.insert("latent_stored_j", self.latent_stored_j);
        record.insert("steps", self.steps as f64);
        record.insert("sim_time_s", self.sim_time_s);
        record.insert("dt_s", self.dt_s);
        record.notes = format!("stop_reason={}", self.stop_reason.as_str());
        for warning in &self.warnings {
            record.warn(warning.clone());
        }
        record
    }

    /// Recompute the efficiency ratios against a measured electrical log
    /// instead of the run ledger. Bench protocols hold the simulated storage
    /// against the logged V*I input, so a miscalibrated supply shows up as an
    /// efficiency shift rather than a silent ledger mismatch.
    pub fn metric_against_log(&self, log: &ElectricalLog) -> EfficiencyMetric {
        let input_j = log.energy_j();
        EfficiencyMetric {
            global_efficiency: EnergyAccountant::efficiency(
                self.stored_global_j + self.latent_stored_j,
                input_j,
            ),
            local_efficiency: EnergyAccountant::efficiency(self.stored_local_j, input_j),
            retained_efficiency: self.metric.retained_efficiency,
            peak_t_k: self.metric.peak_t_k,
            time_to_90pct_s: self.metric.time_to_90pct_s,
        }
    }
}

/// Transient heat-diffusion run over a 2D slab.
///
/// Owns the field and an ordered operator pipeline; each step resets the
/// working buffer, runs the ops, commits, then evaluates the terminal
/// conditions. Runs own all their state, so independent runs never interact.
pub struct Simulation {
    pub config: RunConfig,
    pub props: MaterialProps,
    pub field: GridField,
    pub chambers: Vec<ChamberSource>,
    pub footprints: Vec<ChamberFootprint>,
    pub edge_cells: Vec<usize>,
    pub boundary: BoundaryConditionSpec,
    /// Per-cell latent accumulator, J. All zeros without a latent band.
    pub latent_store_j: Vec<f64>,
    /// Latent capacity of one cell, J. Zero without a latent band.
    pub latent_capacity_per_cell_j: f64,
    pub accountant: EnergyAccountant,
    pub dt_s: f64,
    pub step: usize,
    pub sim_time_s: f64,
    pub ledger: EnergyLedger,
    pub history: Vec<HistorySample>,
    /// Max |dT/dt| of the most recent committed step, K/s.
    pub max_dtdt_k_per_s: f64,
    ops: Vec<Box<dyn SimOp>>,
    pub op_timings: Vec<OpTiming>,
    pub debug: bool,
}

impl Simulation {
    /// Build a run with the standard pipeline:
    /// source deposition -> diffusion -> boundary loss -> latent band.
    pub fn new(config: RunConfig) -> Result<Self, SimError> {
        let mut ops: Vec<Box<dyn SimOp>> = vec![
            Box::new(SourceDepositionOp),
            Box::new(DiffusionOp::new()),
            Box::new(BoundaryLossOp),
        ];
        if config.boundary.latent_band.is_some() {
            ops.push(Box::new(LatentBandOp));
        }
        Self::with_ops(config, ops, false)
    }

    /// Debug variant with console progress reporting attached.
    pub fn new_debug(config: RunConfig) -> Result<Self, SimError> {
        let mut sim = Self::new(config)?;
        let cadence = sim.config.save_interval;
        sim.ops.push(Box::new(ProgressReportOp::new(cadence)));
        sim.debug = true;
        Ok(sim)
    }

    /// Build a run with an explicit pipeline (tests compose their own ops).
    pub fn with_ops(
        config: RunConfig,
        ops: Vec<Box<dyn SimOp>>,
        debug: bool,
    ) -> Result<Self, SimError> {
        config.validate()?;
        let props = config.resolve_material()?;
        let dt_s = config.resolved_dt_s(&props)?;
        let field = GridField::new(
            config.nx,
            config.ny,
            config.dx_m,
            config.dy_m,
            config.boundary.ambient_k,
        );
        let mut footprints = Vec::with_capacity(config.chambers.len());
        for chamber in &config.chambers {
            footprints.push(ChamberFootprint::resolve(chamber, &field, config.thickness_m)?);
        }
        let edge_cells = field.edge_cells();
        let cell_volume = config.dx_m * config.dy_m * config.thickness_m;
        let latent_capacity_per_cell_j = config
            .boundary
            .latent_band
            .map(|band| band.latent_heat_j_per_kg * props.density_kg_m3 * cell_volume)
            .unwrap_or(0.0);
        let accountant = EnergyAccountant::new(
            &field,
            &props,
            config.thickness_m,
            config.boundary.ambient_k,
            &config.chambers[0],
        );
        Ok(Simulation {
            chambers: config.chambers.clone(),
            boundary: config.boundary.clone(),
            latent_store_j: vec![0.0; field.cell_count()],
            latent_capacity_per_cell_j,
            accountant,
            props,
            field,
            footprints,
            edge_cells,
            dt_s,
            step: 0,
            sim_time_s: 0.0,
            ledger: EnergyLedger::default(),
            history: Vec::new(),
            max_dtdt_k_per_s: 0.0,
            ops,
            op_timings: Vec::new(),
            debug,
            config,
        })
    }

    pub fn cell_volume_m3(&self) -> f64 {
        self.field.dx_m * self.field.dy_m * self.config.thickness_m
    }

    pub fn thickness_m(&self) -> f64 {
        self.config.thickness_m
    }

    pub fn latent_stored_total_j(&self) -> f64 {
        self.latent_store_j.iter().sum()
    }

    fn record_history(&mut self) {
        self.history.push(HistorySample {
            time_s: self.sim_time_s,
            peak_k: self.field.peak_kelvin(),
            stored_global_j: self.accountant.stored_global_j(&self.field),
            stored_local_j: self.accountant.stored_local_j(&self.field),
        });
    }

    fn run_phase<F>(&mut self, mut apply: F)
    where
        F: FnMut(&mut Box<dyn SimOp>, &mut Simulation),
    {
        // Take the pipeline out so ops can borrow the simulation mutably.
        let mut ops = std::mem::take(&mut self.ops);
        for (index, op) in ops.iter_mut().enumerate() {
            let started = Instant::now();
            apply(op, self);
            let elapsed = started.elapsed();
            if let Some(timing) = self.op_timings.get_mut(index) {
                timing.total += elapsed;
                timing.calls += 1;
            }
        }
        self.ops = ops;
    }

    /// Advance one step with an ad-hoc operator list (unit-test hook).
    pub fn step_with_ops(&mut self, ops: &mut [&mut dyn SimOp]) {
        self.field.reset_next();
        for op in ops.iter_mut() {
            op.update_sim(self);
        }
        let max_delta = self.field.commit_next();
        self.max_dtdt_k_per_s = max_delta / self.dt_s;
        self.step += 1;
        self.sim_time_s += self.dt_s;
    }

    /// Execute the run to termination.
    pub fn run(&mut self) -> Result<RunOutcome, SimError> {
        if self.step > 0 {
            return Err(SimError::InvalidConfiguration(
                "simulation has already been stepped; build a fresh run".to_string(),
            ));
        }
        self.op_timings = self
            .ops
            .iter()
            .map(|op| OpTiming {
                name: op.name().to_string(),
                total: std::time::Duration::ZERO,
                calls: 0,
            })
            .collect();

        self.run_phase(|op, sim| op.init_sim(sim));
        self.record_history();

        let stop_reason = loop {
            self.field.reset_next();
            self.run_phase(|op, sim| op.update_sim(sim));
            let max_delta = self.field.commit_next();
            self.max_dtdt_k_per_s = max_delta / self.dt_s;
            self.step += 1;
            self.sim_time_s += self.dt_s;

            if !self.field.all_finite() {
                return Err(SimError::NumericalDivergence { step: self.step });
            }
            if self.step % self.config.save_interval == 0 {
                self.record_history();
            }

            let peak = self.field.peak_kelvin();
            if self.config.peak_ceiling_k.is_some_and(|cap| peak >= cap) {
                break StopReason::TemperatureCap;
            }
            if self
                .config
                .quasi_steady_k_per_s
                .is_some_and(|q| self.max_dtdt_k_per_s < q)
            {
                break StopReason::QuasiSteady;
            }
            if self.sim_time_s >= self.config.max_sim_time_s {
                break StopReason::MaxSimTime;
            }
            if self.step >= self.config.max_steps {
                break StopReason::MaxSteps;
            }
        };

        if self.step % self.config.save_interval != 0 {
            self.record_history();
        }
        self.run_phase(|op, sim| op.after_sim(sim));
        if self.debug {
            self.print_timing_report();
        }

        Ok(self.build_outcome(stop_reason))
    }

    fn build_outcome(&self, stop_reason: StopReason) -> RunOutcome {
        let stored_global_j = self.accountant.stored_global_j(&self.field);
        let stored_local_j = self.accountant.stored_local_j(&self.field);
        let latent_stored_j = self.latent_stored_total_j();
        let input_j = self.ledger.input_j;
        let conv_loss_j = self.ledger.conv_loss_j;

        let global_efficiency =
            EnergyAccountant::efficiency(stored_global_j + latent_stored_j, input_j);
        let local_efficiency = EnergyAccountant::efficiency(stored_local_j, input_j);
        let retained_efficiency = EnergyAccountant::retained_efficiency(
            stored_global_j + latent_stored_j,
            conv_loss_j,
        );
        let (mut flag, mut warnings) =
            EnergyAccountant::classify(global_efficiency, local_efficiency);
        if stop_reason == StopReason::TemperatureCap {
            warnings.push(format!(
                "peak temperature reached the {:.1} K ceiling; result flagged implausible",
                self.config.peak_ceiling_k.unwrap_or(f64::NAN)
            ));
            flag = ResultFlag::Implausible;
        }

        let metric = EfficiencyMetric {
            global_efficiency,
            local_efficiency,
            retained_efficiency,
            peak_t_k: self.field.peak_kelvin(),
            time_to_90pct_s: EnergyAccountant::time_to_90pct(
                &self.history,
                self.boundary.ambient_k,
            ),
        };

        RunOutcome {
            stop_reason,
            steps: self.step,
            sim_time_s: self.sim_time_s,
            dt_s: self.dt_s,
            metric,
            flag,
            warnings,
            input_j,
            conv_loss_j,
            stored_global_j,
            stored_local_j,
            latent_stored_j,
            history: self.history.clone(),
        }
    }

    fn print_timing_report(&self) {
        println!("{}", "⏱️ operator timing".bold());
        for timing in &self.op_timings {
            println!(
                "   {:<20} {:>8} calls  {:>12.3} ms total",
                timing.name,
                timing.calls,
                timing.total.as_secs_f64() * 1e3
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::BoundaryConditionSpec;
    use crate::test_support::insulated_single_chamber_config;
    use approx::assert_relative_eq;
    use more_asserts::{assert_ge, assert_gt, assert_le};

    #[test]
    fn insulated_run_stores_all_input_energy() {
        let mut config = insulated_single_chamber_config(30, 1e-3, 4.0e-3, 2.0);
        config.max_steps = 400;
        let mut sim = Simulation::new(config).unwrap();
        let outcome = sim.run().unwrap();

        assert_eq!(outcome.stop_reason, StopReason::MaxSteps);
        assert_gt!(outcome.input_j, 0.0);
        assert_relative_eq!(
            outcome.stored_global_j,
            outcome.input_j,
            max_relative = 1e-6
        );
        assert_eq!(outcome.flag, ResultFlag::Plausible);
    }

    #[test]
    fn peak_rise_is_monotone_under_constant_power() {
        let mut config = insulated_single_chamber_config(30, 1e-3, 4.0e-3, 2.0);
        config.max_steps = 300;
        config.save_interval = 20;
        let mut sim = Simulation::new(config).unwrap();
        let outcome = sim.run().unwrap();

        for pair in outcome.history.windows(2) {
            assert_ge!(pair[1].peak_k, pair[0].peak_k);
        }
    }

    #[test]
    fn temperature_cap_stops_the_run_and_flags_it() {
        let mut config = insulated_single_chamber_config(20, 1e-3, 3.0e-3, 50.0);
        config.max_steps = 100_000;
        config.peak_ceiling_k = Some(350.0);
        let mut sim = Simulation::new(config).unwrap();
        let outcome = sim.run().unwrap();

        assert_eq!(outcome.stop_reason, StopReason::TemperatureCap);
        assert_eq!(outcome.flag, ResultFlag::Implausible);
        assert!(!outcome.warnings.is_empty());
        assert_ge!(outcome.metric.peak_t_k, 350.0);
    }

    #[test]
    fn quasi_steady_detection_stops_an_unheated_run() {
        let mut config = insulated_single_chamber_config(20, 1e-3, 4.0e-3, 0.0);
        config.max_steps = 10_000;
        config.quasi_steady_k_per_s = Some(1e-9);
        let mut sim = Simulation::new(config).unwrap();
        let outcome = sim.run().unwrap();

        // Nothing heats the uniform field, so dT/dt is zero immediately.
        assert_eq!(outcome.stop_reason, StopReason::QuasiSteady);
        assert_eq!(outcome.flag, ResultFlag::Undefined);
        assert_le!(outcome.steps, 2);
    }

    #[test]
    fn robin_edges_leak_energy_from_the_ledger() {
        let mut config = insulated_single_chamber_config(20, 1e-3, 4.0e-3, 5.0);
        config.boundary = BoundaryConditionSpec::robin(298.0, 150.0);
        config.max_steps = 2000;
        let mut sim = Simulation::new(config).unwrap();
        let outcome = sim.run().unwrap();

        assert_gt!(outcome.conv_loss_j, 0.0);
        // Stored plus losses accounts for all the input
        assert_relative_eq!(
            outcome.stored_global_j + outcome.conv_loss_j,
            outcome.input_j,
            max_relative = 1e-6
        );
    }

    #[test]
    fn run_refuses_to_execute_twice() {
        let config = insulated_single_chamber_config(20, 1e-3, 4.0e-3, 2.0);
        let mut sim = Simulation::new(config).unwrap();
        sim.run().unwrap();
        assert!(sim.run().is_err());
    }

    #[test]
    fn measured_electrical_log_reproduces_the_ledger_efficiencies() {
        let mut config = insulated_single_chamber_config(20, 1e-3, 4.0e-3, 2.0);
        config.max_steps = 200;
        let mut sim = Simulation::new(config).unwrap();
        let outcome = sim.run().unwrap();

        // A constant-power log over the run interval integrates to exactly
        // the ledger input, so log-based efficiencies match the ledger's.
        let log = ElectricalLog::from_constant_power(2.0, outcome.sim_time_s);
        let measured = outcome.metric_against_log(&log);
        assert_relative_eq!(
            measured.global_efficiency,
            outcome.metric.global_efficiency,
            max_relative = 1e-9
        );
        assert_relative_eq!(
            measured.local_efficiency,
            outcome.metric.local_efficiency,
            max_relative = 1e-9
        );

        // A supply logged at half the power doubles the apparent efficiency
        let half = ElectricalLog::from_constant_power(1.0, outcome.sim_time_s);
        assert_relative_eq!(
            outcome.metric_against_log(&half).global_efficiency,
            2.0 * outcome.metric.global_efficiency,
            max_relative = 1e-9
        );
    }

    #[test]
    fn outcome_flattens_into_a_metrics_record() {
        let mut config = insulated_single_chamber_config(20, 1e-3, 4.0e-3, 2.0);
        config.max_steps = 100;
        config.seed = Some(7);
        let mut sim = Simulation::new(config.clone()).unwrap();
        let outcome = sim.run().unwrap();
        let record = outcome.to_metrics_record("SIM-HT-CONJ", &config);

        assert_eq!(record.seed, Some(7));
        assert!(record.get("global_efficiency").is_some());
        assert!(record.get("peak_t_k").is_some());
        assert!(record.notes.contains("max_steps"));
    }
}
