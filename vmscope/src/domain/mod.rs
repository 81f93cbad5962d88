//! Ids, sentinels and error types shared by the chart store and the
//! call-tree flattener.
//!
//! `MethodId` and `SeriesIndex` come from `vmscope-common`; the time
//! dimension and the error enums live here.

pub mod errors;
pub mod types;

// Re-export common types for convenience
pub use types::{MethodId, SeriesIndex, TimeDimension, NO_VALUE, THREAD_ROOT_METHOD_ID};

pub use errors::{ExportError, StorageError, TreeError};
