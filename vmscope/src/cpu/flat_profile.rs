//! Flat per-method profile produced by the flattener.
//!
//! This is the "view model" handed to tables: one row per method that was
//! invoked at least once, with times already converted to microseconds and
//! clamped at zero. The thread-root quasi-method never appears as a row.
//!
//! # Display in a table
//!
//! ```text
//! Method                               Self (µs)      %    Total (µs)  Calls
//! ─────────────────────────────────────────────────────────────────────────────
//! com.acme.Codec.encode(I)V              812 004   61.2     1 020 331    420
//! com.acme.App.run()                     300 117   22.6     1 326 448      1
//! ```

// Percentage calculations intentionally convert i64 to f64
#![allow(clippy::cast_precision_loss)]

use std::cmp::Ordering;

use crate::cpu::filter::InstrumentationFilter;
use crate::domain::{MethodId, TimeDimension};

/// One method in a flat profile. Times are microseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatRow {
    pub method_id: MethodId,
    /// Formatted `pkg.Class.method(signature)`.
    pub name: String,
    /// Class name as reported by the method mapper, used for filtering.
    pub class_name: String,
    pub net_time0: i64,
    /// Present only when two timestamps were collected.
    pub net_time1: Option<i64>,
    pub total_time0: i64,
    pub total_time1: Option<i64>,
    pub invocations: u32,
}

impl FlatRow {
    #[must_use]
    pub fn net_time(&self, dimension: TimeDimension) -> i64 {
        match dimension {
            TimeDimension::Primary => self.net_time0,
            TimeDimension::Secondary => self.net_time1.unwrap_or(0),
        }
    }

    #[must_use]
    pub fn total_time(&self, dimension: TimeDimension) -> i64 {
        match dimension {
            TimeDimension::Primary => self.total_time0,
            TimeDimension::Secondary => self.total_time1.unwrap_or(0),
        }
    }
}

/// Column a flat profile can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SortKey {
    Name,
    #[default]
    Time,
    #[value(name = "time1")]
    SecondaryTime,
    Total,
    #[value(name = "total1")]
    SecondaryTotal,
    Invocations,
}

/// Immutable flat profile of one sampling run.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatProfile {
    rows: Vec<FlatRow>,
    two_timestamps: bool,
    whole_graph_net_time0: i64,
    whole_graph_net_time1: i64,
    total_invocations: u64,
}

impl FlatProfile {
    pub(crate) fn new(
        rows: Vec<FlatRow>,
        two_timestamps: bool,
        whole_graph_net_time0: i64,
        whole_graph_net_time1: i64,
    ) -> Self {
        let total_invocations = rows.iter().map(|r| u64::from(r.invocations)).sum();
        Self { rows, two_timestamps, whole_graph_net_time0, whole_graph_net_time1, total_invocations }
    }

    #[must_use]
    pub fn rows(&self) -> &[FlatRow] {
        &self.rows
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Row of a given method, if it was invoked and is not filtered away.
    #[must_use]
    pub fn row_for(&self, method: MethodId) -> Option<&FlatRow> {
        self.rows.iter().find(|r| r.method_id == method)
    }

    #[must_use]
    pub fn is_collecting_two_timestamps(&self) -> bool {
        self.two_timestamps
    }

    /// Sum of all method self times in µs, thread root excluded.
    #[must_use]
    pub fn whole_graph_net_time(&self, dimension: TimeDimension) -> i64 {
        match dimension {
            TimeDimension::Primary => self.whole_graph_net_time0,
            TimeDimension::Secondary => self.whole_graph_net_time1,
        }
    }

    #[must_use]
    pub fn total_invocations(&self) -> u64 {
        self.total_invocations
    }

    /// Share of the whole-graph self time spent in `row` (0.0 - 100.0).
    #[must_use]
    pub fn percent(&self, row: &FlatRow, dimension: TimeDimension) -> f64 {
        let whole = self.whole_graph_net_time(dimension);
        if whole > 0 {
            row.net_time(dimension) as f64 / whole as f64 * 100.0
        } else {
            0.0
        }
    }

    /// Reorder rows. Ties keep method-id order so output is deterministic.
    pub fn sort_by(&mut self, key: SortKey, ascending: bool) {
        self.rows.sort_by(|a, b| {
            let primary = match key {
                SortKey::Name => a.name.cmp(&b.name),
                SortKey::Time => a.net_time0.cmp(&b.net_time0),
                SortKey::SecondaryTime => {
                    a.net_time(TimeDimension::Secondary).cmp(&b.net_time(TimeDimension::Secondary))
                }
                SortKey::Total => a.total_time0.cmp(&b.total_time0),
                SortKey::SecondaryTotal => {
                    a.total_time(TimeDimension::Secondary).cmp(&b.total_time(TimeDimension::Secondary))
                }
                SortKey::Invocations => a.invocations.cmp(&b.invocations),
            };
            let primary = if ascending { primary } else { primary.reverse() };
            match primary {
                Ordering::Equal => a.method_id.cmp(&b.method_id),
                other => other,
            }
        });
    }

    /// Drop rows whose class does not pass `filter`.
    ///
    /// Matching is on the class name, the same key the flattener filters by,
    /// so an exact pattern such as `com.acme.App` keeps every method of that
    /// class. The formatted method name is never matched.
    ///
    /// Whole-graph totals are left as they were so percentages stay relative
    /// to the full run; the invocation total follows the visible rows.
    pub fn retain(&mut self, filter: &InstrumentationFilter) {
        if filter.is_empty() {
            return;
        }
        self.rows.retain(|r| filter.passes(&r.class_name));
        self.total_invocations = self.rows.iter().map(|r| u64::from(r.invocations)).sum();
    }
}
