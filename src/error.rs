//! Error types for catalog loading and record validation

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("song record is missing an id")]
    MissingId,

    #[error("song {0} has an empty title")]
    MissingTitle(String),

    #[error("transition rule {0:?} has no target")]
    MissingTarget(String),

    #[error("invalid clock value {0:?} (expected m:ss)")]
    InvalidClock(String),

    #[error("duplicate song id {0}")]
    DuplicateSong(String),

    #[error("failed to read catalog {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
