//! Time-series storage for synchronous XY charts
//!
//! This module holds the data side of the charts: a bounded, growable ring of
//! rows (one timestamp plus one value per series) and the private binary
//! snapshot format used to save and restore it. Rendering and axis logic live
//! with the consumers; they only read back through [`XyStorage`] and
//! [`XyItem`].

mod ring_index;
pub mod snapshot;
pub mod xy_storage;

pub use snapshot::SnapshotHeader;
pub use xy_storage::{StorageConfig, XyItem, XyStorage};
