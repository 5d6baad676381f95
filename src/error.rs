//! Error types for dataset loading.
//!
//! Only the loader can fail. Lookups that miss (unknown code, unmapped
//! organism group, no ECOFFs) are represented as `None` or empty vectors by
//! the query layer and never surface here.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("data directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),

    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type DataResult<T> = Result<T, DataError>;
