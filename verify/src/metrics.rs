//! Measured metric values and the bundle they are written out in.

use crate::error::VerifyError;
use crate::requirement::{Requirement, Verdict};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One computed statistic, optionally held against a requirement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub metric: String,
    /// `None` when the statistic could not be computed
    pub value: Option<f64>,
    pub unit: String,
    pub requirement: Option<Requirement>,
    /// Present exactly when `requirement` is
    pub verdict: Option<Verdict>,
}

impl Measurement {
    /// Informational value with no threshold attached
    pub fn info(metric: impl Into<String>, value: Option<f64>, unit: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            value,
            unit: unit.into(),
            requirement: None,
            verdict: None,
        }
    }

    /// Value evaluated against `requirement`; the metric takes its name
    pub fn checked(requirement: Requirement, value: Option<f64>) -> Self {
        let verdict = requirement.evaluate(value);
        Self {
            metric: requirement.name.clone(),
            value,
            unit: requirement.unit.clone(),
            verdict: Some(verdict),
            requirement: Some(requirement),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.verdict.is_some_and(|v| !v.is_pass())
    }
}

/// Every measurement from one verification run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricBundle {
    pub dataset: String,
    pub generated_at: DateTime<Utc>,
    pub measurements: Vec<Measurement>,
}

impl MetricBundle {
    pub fn new(dataset: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            generated_at: Utc::now(),
            measurements: Vec::new(),
        }
    }

    pub fn extend(&mut self, measurements: impl IntoIterator<Item = Measurement>) {
        self.measurements.extend(measurements);
    }

    /// Requirement-bearing measurements that did not pass
    pub fn failures(&self) -> Vec<&Measurement> {
        self.measurements.iter().filter(|m| m.is_failure()).collect()
    }

    /// True when every requirement passed; bundles without requirements pass
    pub fn all_passed(&self) -> bool {
        self.failures().is_empty()
    }

    pub fn get(&self, metric: &str) -> Option<&Measurement> {
        self.measurements.iter().find(|m| m.metric == metric)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), VerifyError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| VerifyError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load_from_file(path: &Path) -> Result<Self, VerifyError> {
        let json = std::fs::read_to_string(path).map_err(|source| VerifyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&json)?)
    }
}
