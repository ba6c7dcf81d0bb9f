//! Shared components for the survey verification tools.
//!
//! Sky geometry, angle units, source catalogs, sky cross-matching and the
//! statistics used by every verification check live here so the checks
//! themselves stay small.

pub mod algo;
pub mod catalog;
pub mod range_arg;
pub mod sky;
pub mod synthetic;
pub mod units;

pub use catalog::{CatalogError, Source, SourceCatalog};
pub use sky::Equatorial;
pub use units::{Angle, AngleExt};
