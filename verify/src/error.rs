use crate::config::ConfigError;
use shared::algo::StatsError;
use shared::CatalogError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while running verification checks
#[derive(Error, Debug)]
pub enum VerifyError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("statistics failed for {metric}: {source}")]
    Stats {
        metric: String,
        #[source]
        source: StatsError,
    },
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed metric bundle: {0}")]
    Json(#[from] serde_json::Error),
}
