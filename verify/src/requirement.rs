//! Numeric performance requirements and their evaluation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a measured value is compared with its threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
}

impl Comparison {
    pub fn holds(&self, value: f64, threshold: f64) -> bool {
        match self {
            Comparison::LessThan => value < threshold,
            Comparison::LessOrEqual => value <= threshold,
            Comparison::GreaterThan => value > threshold,
            Comparison::GreaterOrEqual => value >= threshold,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::LessThan => "<",
            Comparison::LessOrEqual => "<=",
            Comparison::GreaterThan => ">",
            Comparison::GreaterOrEqual => ">=",
        }
    }
}

/// Result of holding a measurement against a requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Fail,
    /// The statistic could not be computed (too few sources, no pairs)
    NotComputed,
}

impl Verdict {
    /// Anything other than an explicit pass blocks acceptance
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Verdict::Pass => "PASS",
            Verdict::Fail => "FAIL",
            Verdict::NotComputed => "N/A",
        };
        f.write_str(text)
    }
}

/// A fixed threshold a metric must meet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub name: String,
    pub description: String,
    pub threshold: f64,
    pub unit: String,
    pub comparison: Comparison,
}

impl Requirement {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        comparison: Comparison,
        threshold: f64,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            threshold,
            unit: unit.into(),
            comparison,
        }
    }

    /// Upper bound: value must not exceed `threshold`
    pub fn at_most(
        name: impl Into<String>,
        description: impl Into<String>,
        threshold: f64,
        unit: impl Into<String>,
    ) -> Self {
        Self::new(name, description, Comparison::LessOrEqual, threshold, unit)
    }

    /// Lower bound: value must reach `threshold`
    pub fn at_least(
        name: impl Into<String>,
        description: impl Into<String>,
        threshold: f64,
        unit: impl Into<String>,
    ) -> Self {
        Self::new(name, description, Comparison::GreaterOrEqual, threshold, unit)
    }

    pub fn evaluate(&self, value: Option<f64>) -> Verdict {
        match value {
            Some(v) if !v.is_nan() => {
                if self.comparison.holds(v, self.threshold) {
                    Verdict::Pass
                } else {
                    Verdict::Fail
                }
            }
            _ => Verdict::NotComputed,
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.name,
            self.comparison.symbol(),
            self.threshold,
            self.unit
        )
    }
}
