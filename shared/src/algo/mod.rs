//! Matching and statistics algorithms for catalog verification
//!
//! - `kdtree`: spatial index over unit vectors
//! - `crossmatch`: nearest-neighbour and mutual sky matching
//! - `pairs`: all-to-all pair separations and relative astrometry
//! - `stats`: robust summary statistics

pub mod crossmatch;
pub mod kdtree;
pub mod pairs;
pub mod stats;

pub use crossmatch::{has_counterpart, match_to_catalog, mutual_matches, MatchResult, MatchedPair};
pub use pairs::{all_pairs, pair_separation_errors, pair_separations, PairErrors, SeparationBand};
pub use stats::{median, outlier_fraction, percentile, rms, StatsError, SummaryStats};
