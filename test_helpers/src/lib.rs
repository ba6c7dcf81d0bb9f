//! Test helpers for the verification workspace
//!
//! Provides the project root, a scratch directory for test artifacts and
//! ready-made synthetic catalog pairs.

use once_cell::sync::Lazy;
use shared::synthetic::{observe, reference_field, FieldConfig, ObservationModel};
use shared::SourceCatalog;
use std::env;
use std::path::{Path, PathBuf};

/// Error type for test helper operations
#[derive(thiserror::Error, Debug)]
pub enum TestHelperError {
    #[error("Failed to find project root: {0}")]
    ProjectRootNotFound(String),
}

/// Returns the path to the workspace root by walking up to the Cargo.toml
/// that declares `[workspace]`.
pub fn find_project_root() -> Result<PathBuf, TestHelperError> {
    let mut current_dir = env::current_dir().map_err(|e| {
        TestHelperError::ProjectRootNotFound(format!("Failed to get current directory: {}", e))
    })?;

    loop {
        let cargo_toml = current_dir.join("Cargo.toml");
        if cargo_toml.exists() {
            let content = std::fs::read_to_string(&cargo_toml).map_err(|e| {
                TestHelperError::ProjectRootNotFound(format!("Failed to read Cargo.toml: {}", e))
            })?;

            if content.contains("[workspace]") {
                return Ok(current_dir);
            }
        }

        if !current_dir.pop() {
            break;
        }
    }

    Err(TestHelperError::ProjectRootNotFound(
        "Workspace root not found".to_string(),
    ))
}

static PROJECT_ROOT: Lazy<PathBuf> =
    Lazy::new(|| find_project_root().expect("Failed to find project root directory"));

/// Directory for test artifacts (metric bundles, reports), created on demand
pub fn get_output_dir() -> PathBuf {
    let output_dir = PROJECT_ROOT.join("test_output");

    if !output_dir.exists() {
        std::fs::create_dir_all(&output_dir).expect("Failed to create output directory");
    }

    output_dir
}

/// Path of `path` inside the output directory
pub fn output_path<P: AsRef<Path>>(path: P) -> PathBuf {
    get_output_dir().join(path)
}

/// A reference field and an observation of it.
///
/// Every source is brighter than the detection limit, so the observed
/// catalog contains exactly one detection per reference source plus
/// `spurious` fakes.
pub fn observed_field(
    num_sources: usize,
    sigma_mas: f64,
    spurious: usize,
    seed: u64,
) -> (SourceCatalog, SourceCatalog) {
    let field = FieldConfig {
        num_sources,
        seed,
        ..FieldConfig::default()
    };
    let model = ObservationModel {
        astrometric_sigma_mas: sigma_mas,
        detection_limit: field.magnitudes.faint + 1.0,
        spurious_count: spurious,
        seed: seed.wrapping_add(1),
        ..ObservationModel::default()
    };
    let reference = reference_field(&field).expect("default field is valid");
    let observed = observe(&reference, &field, &model).expect("observation model is valid");
    (observed, reference)
}
