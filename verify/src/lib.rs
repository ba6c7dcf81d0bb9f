//! Survey performance verification.
//!
//! Cross-matches a measured catalog against a reference, computes
//! astrometric and detection statistics and holds them against fixed
//! requirements.

pub mod checks;
pub mod cli;
pub mod config;
pub mod error;
pub mod metrics;
pub mod report;
pub mod requirement;
pub mod runner;

pub use config::VerifyConfig;
pub use error::VerifyError;
pub use metrics::{Measurement, MetricBundle};
pub use requirement::{Comparison, Requirement, Verdict};
