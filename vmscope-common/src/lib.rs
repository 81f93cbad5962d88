//! # Shared Constants and Identifiers
//!
//! Defines the wire-level constants of the XY snapshot format and the plain
//! identifier types shared by the chart store, the CPU flattener and any
//! consumer that reads their output. Nothing here allocates, so the crate
//! stays `no_std`.
//!
//! ## Key Items
//!
//! - [`SNAPSHOT_HEADER`] / [`SNAPSHOT_VERSION`] - XY snapshot envelope
//! - [`NO_VALUE`] - sentinel for rows appended before a series existed
//! - [`THREAD_ROOT_METHOD_ID`] - reserved slot of the call-tree thread root
//! - [`MethodId`] / [`SeriesIndex`] - dense integer identifiers

#![cfg_attr(not(test), no_std)]

// ============================================================================
// XY Snapshot Format
// ============================================================================

/// Header tag written (length-prefixed) at the start of every XY snapshot.
pub const SNAPSHOT_HEADER: &str = "XYStorageSnapshot";

/// The only snapshot format version understood by readers and writers.
pub const SNAPSHOT_VERSION: i32 = 1;

/// Value stored for a row that has no sample for a series.
///
/// Defined as `i64::MIN - 1` with two's complement wrap-around, which lands on
/// `i64::MAX`. Snapshot files carry the same bit pattern.
pub const NO_VALUE: i64 = i64::MIN.wrapping_sub(1);

// ============================================================================
// Call-Tree Conventions
// ============================================================================

/// Method id reserved for the per-thread root of a call tree.
///
/// The root slot accumulates like any other method but never shows up as a
/// flat-profile row and is left out of whole-graph totals.
pub const THREAD_ROOT_METHOD_ID: MethodId = MethodId(0);

/// Nanoseconds per microsecond, used when finalizing flat profiles.
pub const NANOS_PER_MICRO: i64 = 1_000;

// ============================================================================
// Identifiers
// ============================================================================

/// Dense method identifier (0..N) assigned by the method mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct MethodId(pub u32);

impl MethodId {
    /// Slot of this method in per-method accumulator arrays.
    #[must_use]
    pub const fn slot(self) -> usize {
        self.0 as usize
    }

    /// True for the reserved thread-root id.
    #[must_use]
    pub const fn is_thread_root(self) -> bool {
        self.0 == THREAD_ROOT_METHOD_ID.0
    }
}

impl core::fmt::Display for MethodId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "method#{}", self.0)
    }
}

/// Position of a series inside an XY store, stable for the store's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SeriesIndex(pub usize);

impl core::fmt::Display for SeriesIndex {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "series#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_value_matches_wrapped_min() {
        assert_eq!(NO_VALUE, i64::MAX);
        assert_ne!(NO_VALUE, i64::MIN);
    }

    #[test]
    fn test_thread_root_slot() {
        assert!(THREAD_ROOT_METHOD_ID.is_thread_root());
        assert_eq!(MethodId(7).slot(), 7);
        assert!(!MethodId(7).is_thread_root());
    }
}
