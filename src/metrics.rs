use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::constants::METRICS_SCHEMA_VERSION;
use crate::errors::SimError;

/// Flat key-value metrics record with provenance, the output artifact every
/// simulation produces and the physical-test protocols diff against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub sim_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub seed: Option<u64>,
    /// Parameter snapshot of the producing run.
    pub params: serde_json::Value,
    pub metrics: BTreeMap<String, f64>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub notes: String,
    pub schema_version: u32,
}

impl MetricsRecord {
    pub fn new(sim_id: &str, params: serde_json::Value) -> Self {
        MetricsRecord {
            sim_id: sim_id.to_string(),
            timestamp: Utc::now(),
            seed: None,
            params,
            metrics: BTreeMap::new(),
            warnings: Vec::new(),
            notes: String::new(),
            schema_version: METRICS_SCHEMA_VERSION,
        }
    }

    pub fn insert(&mut self, key: &str, value: f64) {
        self.metrics.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.metrics.get(key).copied()
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Compare against a previously recorded reference, producing absolute
    /// and relative error per shared field and listing one-sided keys.
    pub fn compare(&self, reference: &MetricsRecord) -> MetricsDiff {
        let mut fields = BTreeMap::new();
        let mut missing_in_candidate = Vec::new();
        for (key, ref_value) in &reference.metrics {
            match self.metrics.get(key) {
                Some(value) => {
                    let absolute = value - ref_value;
                    let relative = if ref_value.abs() < f64::EPSILON {
                        if absolute.abs() < f64::EPSILON { 0.0 } else { f64::INFINITY }
                    } else {
                        absolute.abs() / ref_value.abs()
                    };
                    fields.insert(key.clone(), FieldError { absolute, relative });
                }
                None => missing_in_candidate.push(key.clone()),
            }
        }
        let missing_in_reference = self
            .metrics
            .keys()
            .filter(|k| !reference.metrics.contains_key(*k))
            .cloned()
            .collect();
        MetricsDiff {
            fields,
            missing_in_reference,
            missing_in_candidate,
        }
    }

    /// Serialize to `<dir>/sim_<id>_<timestamp>.json`, returning the path.
    pub fn save(&self, dir: &Path) -> Result<PathBuf, SimError> {
        std::fs::create_dir_all(dir).map_err(|e| {
            SimError::InvalidConfiguration(format!("cannot create {}: {}", dir.display(), e))
        })?;
        let stamp = self.timestamp.format("%Y%m%dT%H%M%S%3fZ");
        let path = dir.join(format!("sim_{}_{}.json", self.sim_id, stamp));
        let json = serde_json::to_string_pretty(self).map_err(|e| {
            SimError::InvalidConfiguration(format!("serialization failed: {}", e))
        })?;
        std::fs::write(&path, json).map_err(|e| {
            SimError::InvalidConfiguration(format!("cannot write {}: {}", path.display(), e))
        })?;
        Ok(path)
    }
}

/// Per-field error of a candidate record against a reference.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FieldError {
    pub absolute: f64,
    pub relative: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsDiff {
    pub fields: BTreeMap<String, FieldError>,
    pub missing_in_reference: Vec<String>,
    pub missing_in_candidate: Vec<String>,
}

impl MetricsDiff {
    pub fn max_relative_error(&self) -> f64 {
        self.fields
            .values()
            .map(|f| f.relative)
            .fold(0.0, f64::max)
    }

    pub fn is_complete(&self) -> bool {
        self.missing_in_candidate.is_empty() && self.missing_in_reference.is_empty()
    }
}
