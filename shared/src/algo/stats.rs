//! Robust summary statistics for astrometric residuals
//!
//! All functions ignore NaN entries (unmatched or unmeasured values) but
//! keep infinities, and fail with [`StatsError::InsufficientData`] when
//! nothing valid remains.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Scale factor turning a median absolute deviation into a Gaussian sigma
pub const MAD_TO_SIGMA: f64 = 1.482_602_218_505_602;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    #[error("Insufficient data points: {total} total values, {valid} valid")]
    InsufficientData { total: usize, valid: usize },
    #[error("Percentile {0} is outside [0, 100]")]
    InvalidPercentile(f64),
}

/// Sorted copy of the non-NaN values, or an error if none remain
fn sorted_valid(values: &[f64]) -> Result<Vec<f64>, StatsError> {
    let mut valid: Vec<f64> = values.iter().filter(|v| !v.is_nan()).copied().collect();
    if valid.is_empty() {
        return Err(StatsError::InsufficientData {
            total: values.len(),
            valid: 0,
        });
    }
    valid.sort_by(|a, b| a.total_cmp(b));
    Ok(valid)
}

fn valid_values(values: &[f64]) -> Result<Vec<f64>, StatsError> {
    let valid: Vec<f64> = values.iter().filter(|v| !v.is_nan()).copied().collect();
    if valid.is_empty() {
        return Err(StatsError::InsufficientData {
            total: values.len(),
            valid: 0,
        });
    }
    Ok(valid)
}

/// Percentile of already sorted data with linear interpolation between ranks
fn percentile_of_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let frac = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

/// Median of the values.
///
/// For even-length data, returns the average of the two middle values.
pub fn median(values: &[f64]) -> Result<f64, StatsError> {
    let sorted = sorted_valid(values)?;
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Ok((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Ok(sorted[mid])
    }
}

/// The `p`-th percentile (0..=100), interpolating linearly between ranks
pub fn percentile(values: &[f64], p: f64) -> Result<f64, StatsError> {
    if !(0.0..=100.0).contains(&p) {
        return Err(StatsError::InvalidPercentile(p));
    }
    let sorted = sorted_valid(values)?;
    Ok(percentile_of_sorted(&sorted, p))
}

pub fn mean(values: &[f64]) -> Result<f64, StatsError> {
    let valid = valid_values(values)?;
    Ok(valid.iter().sum::<f64>() / valid.len() as f64)
}

/// Root mean square about zero
pub fn rms(values: &[f64]) -> Result<f64, StatsError> {
    let valid = valid_values(values)?;
    Ok((valid.iter().map(|v| v * v).sum::<f64>() / valid.len() as f64).sqrt())
}

/// Population standard deviation about the mean
pub fn std_dev(values: &[f64]) -> Result<f64, StatsError> {
    let valid = valid_values(values)?;
    let n = valid.len() as f64;
    let mean = valid.iter().sum::<f64>() / n;
    Ok((valid.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt())
}

/// Median absolute deviation from the median (unscaled)
pub fn median_absolute_deviation(values: &[f64]) -> Result<f64, StatsError> {
    let center = median(values)?;
    let deviations: Vec<f64> = values
        .iter()
        .filter(|v| !v.is_nan())
        .map(|v| (v - center).abs())
        .collect();
    median(&deviations)
}

/// Fraction of values whose magnitude exceeds `threshold`
pub fn outlier_fraction(values: &[f64], threshold: f64) -> Result<f64, StatsError> {
    let valid = valid_values(values)?;
    let outliers = valid.iter().filter(|v| v.abs() > threshold).count();
    Ok(outliers as f64 / valid.len() as f64)
}

/// One-shot summary of a residual distribution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub count: usize,
    pub median: f64,
    pub mean: f64,
    pub rms: f64,
    /// Robust sigma estimated from the MAD
    pub sigma_mad: f64,
    pub p68: f64,
    pub p95: f64,
    pub min: f64,
    pub max: f64,
}

impl SummaryStats {
    pub fn from_values(values: &[f64]) -> Result<Self, StatsError> {
        let sorted = sorted_valid(values)?;
        Ok(Self {
            count: sorted.len(),
            median: median(&sorted)?,
            mean: mean(&sorted)?,
            rms: rms(&sorted)?,
            sigma_mad: median_absolute_deviation(&sorted)? * MAD_TO_SIGMA,
            p68: percentile_of_sorted(&sorted, 68.0),
            p95: percentile_of_sorted(&sorted, 95.0),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
        })
    }
}
