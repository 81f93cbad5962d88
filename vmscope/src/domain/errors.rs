//! Errors for snapshot I/O, call-tree loading and profile export.

use super::types::MethodId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Invalid storage capacity: values limit {values_limit}, buffer step {buffer_step}")]
    InvalidCapacity { values_limit: usize, buffer_step: usize },

    #[error("Row has {actual} values but the storage has {expected} series")]
    RowWidthMismatch { expected: usize, actual: usize },

    #[error("Not an XY snapshot: unexpected header {0:?}")]
    BadHeader(String),

    #[error("Unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion { found: i32, expected: i32 },

    #[error("Snapshot has {found} series but the storage has {expected}")]
    SeriesCountMismatch { found: usize, expected: usize },

    #[error("Snapshot declares a negative count: {0}")]
    NegativeCount(i32),

    #[error("Snapshot too large to encode: {0}")]
    TooLarge(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("Failed to parse call tree: {0}")]
    TreeParseFailed(String),

    #[error("Call tree references {0} which is not in the method table")]
    UnknownMethod(MethodId),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
