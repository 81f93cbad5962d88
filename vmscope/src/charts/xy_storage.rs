//! Bounded storage for synchronous XY chart series.
//!
//! All series share one timestamp axis: a row is one timestamp plus one value
//! per registered series and is appended as a unit.
//!
//! # Memory Model
//!
//! ```text
//!   allocated:  0 ──step──► step ──step──► ... ──► values_limit
//!               (grow: resize every column, rotation reset to 0)
//!
//!   full ring:  [ r3 | r4 | r0 | r1 | r2 ]      head = 2
//!                        ▲
//!                        └── next append overwrites the oldest row
//! ```
//!
//! Logical row 0 is always the oldest retained row, logical row `count - 1`
//! the newest. Callers never see physical slots.
//!
//! # Concurrency
//!
//! [`XyStorage`] is a cheap cloneable handle around one mutex. Appends, series
//! registration, snapshot load and every read take that lock, so a reader can
//! never observe a row half way through a grow or an overwrite.

use std::io::{Read, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info};

use super::ring_index::{Advance, RingIndex};
use super::snapshot::{read_i64, write_i64, SnapshotHeader};
use crate::domain::{SeriesIndex, StorageError, NO_VALUE};

/// Capacity settings for an [`XyStorage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageConfig {
    /// Maximum number of rows kept; older rows are overwritten past this.
    pub values_limit: usize,
    /// Number of row slots added per growth step.
    pub buffer_step: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { values_limit: 1024, buffer_step: 64 }
    }
}

impl StorageConfig {
    fn validate(self) -> Result<Self, StorageError> {
        if self.values_limit == 0 || self.buffer_step == 0 {
            return Err(StorageError::InvalidCapacity {
                values_limit: self.values_limit,
                buffer_step: self.buffer_step,
            });
        }
        Ok(self)
    }
}

/// One registered series and its column.
#[derive(Debug)]
struct SeriesColumn {
    name: String,
    min_value: i64,
    max_value: i64,
    /// Smallest and largest real value ever appended, `NO_VALUE` excluded.
    observed: Option<(i64, i64)>,
    /// Same physical length and layout as `StorageState::timestamps`.
    values: Vec<i64>,
}

impl SeriesColumn {
    fn record(&mut self, slot: usize, value: i64) {
        self.values[slot] = value;
        if value == NO_VALUE {
            return;
        }
        self.observed = Some(match self.observed {
            Some((lo, hi)) => (lo.min(value), hi.max(value)),
            None => (value, value),
        });
    }

    fn bounds(&self) -> (i64, i64) {
        match self.observed {
            Some((lo, hi)) => (self.min_value.min(lo), self.max_value.max(hi)),
            None => (self.min_value, self.max_value),
        }
    }
}

#[derive(Debug)]
struct StorageState {
    config: StorageConfig,
    ring: RingIndex,
    timestamps: Vec<i64>,
    series: Vec<SeriesColumn>,
}

impl StorageState {
    fn append(&mut self, timestamp: i64, values: &[i64]) -> Result<(), StorageError> {
        if values.len() != self.series.len() {
            return Err(StorageError::RowWidthMismatch { expected: self.series.len(), actual: values.len() });
        }

        let slot = match self.ring.advance() {
            Advance::Free(slot) | Advance::Overwrite(slot) => slot,
            Advance::Grow { allocated, slot } => {
                debug!("Growing XY storage from {} to {allocated} rows", self.timestamps.len());
                self.timestamps.resize(allocated, 0);
                for column in &mut self.series {
                    column.values.resize(allocated, NO_VALUE);
                }
                slot
            }
        };

        self.timestamps[slot] = timestamp;
        for (column, &value) in self.series.iter_mut().zip(values) {
            column.record(slot, value);
        }
        Ok(())
    }

    fn timestamp(&self, index: usize) -> Option<i64> {
        self.ring.physical(index).map(|slot| self.timestamps[slot])
    }

    fn value(&self, series: SeriesIndex, index: usize) -> Option<i64> {
        let column = self.series.get(series.0)?;
        self.ring.physical(index).map(|slot| column.values[slot])
    }
}

/// Shared, bounded, growable store of synchronized time series.
#[derive(Debug, Clone)]
pub struct XyStorage {
    state: Arc<Mutex<StorageState>>,
}

impl Default for XyStorage {
    fn default() -> Self {
        Self::from_valid_config(StorageConfig::default())
    }
}

impl XyStorage {
    /// Create an empty store.
    ///
    /// # Errors
    /// Returns [`StorageError::InvalidCapacity`] if either limit is zero.
    pub fn new(config: StorageConfig) -> Result<Self, StorageError> {
        config.validate().map(Self::from_valid_config)
    }

    /// Shorthand for [`XyStorage::new`] with explicit limits.
    ///
    /// # Errors
    /// Returns [`StorageError::InvalidCapacity`] if either limit is zero.
    pub fn with_limits(values_limit: usize, buffer_step: usize) -> Result<Self, StorageError> {
        Self::new(StorageConfig { values_limit, buffer_step })
    }

    fn from_valid_config(config: StorageConfig) -> Self {
        let state = StorageState {
            config,
            ring: RingIndex::new(config.values_limit, config.buffer_step),
            timestamps: Vec::new(),
            series: Vec::new(),
        };
        Self { state: Arc::new(Mutex::new(state)) }
    }

    fn lock(&self) -> MutexGuard<'_, StorageState> {
        // A row is only written after its width check, so poisoning cannot
        // leave a torn row behind
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new series.
    ///
    /// Rows appended before the series existed read back as [`NO_VALUE`].
    pub fn add_series(&self, name: impl Into<String>, min_value: i64, max_value: i64) -> XyItem {
        let mut state = self.lock();
        let index = SeriesIndex(state.series.len());
        let name = name.into();
        let allocated = state.timestamps.len();
        state.series.push(SeriesColumn {
            name: name.clone(),
            min_value,
            max_value,
            observed: None,
            values: vec![NO_VALUE; allocated],
        });
        debug!("Added series {index} '{name}' ({} existing rows back-filled)", state.ring.len());
        XyItem { storage: self.clone(), index, name, min_value, max_value }
    }

    /// Append one synchronized row.
    ///
    /// # Errors
    /// Returns [`StorageError::RowWidthMismatch`] if `values` does not have
    /// exactly one entry per registered series. The store is left unchanged.
    pub fn append(&self, timestamp: i64, values: &[i64]) -> Result<(), StorageError> {
        self.lock().append(timestamp, values)
    }

    /// True once the row count has reached the values limit.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.lock().ring.is_full()
    }

    /// Number of rows currently retained.
    #[must_use]
    pub fn timestamps_count(&self) -> usize {
        self.lock().ring.len()
    }

    /// Timestamp of a logical row (0 = oldest).
    #[must_use]
    pub fn timestamp(&self, index: usize) -> Option<i64> {
        self.lock().timestamp(index)
    }

    /// Raw value of a series at a logical row; may be [`NO_VALUE`].
    #[must_use]
    pub fn value(&self, series: SeriesIndex, index: usize) -> Option<i64> {
        self.lock().value(series, index)
    }

    /// Like [`XyStorage::value`] but maps [`NO_VALUE`] to `None`.
    #[must_use]
    pub fn value_or_none(&self, series: SeriesIndex, index: usize) -> Option<i64> {
        self.value(series, index).filter(|&v| v != NO_VALUE)
    }

    #[must_use]
    pub fn series_count(&self) -> usize {
        self.lock().series.len()
    }

    /// Physical row slots currently allocated (never above the values limit).
    #[must_use]
    pub fn allocated_rows(&self) -> usize {
        self.lock().ring.allocated()
    }

    #[must_use]
    pub fn values_limit(&self) -> usize {
        self.lock().config.values_limit
    }

    #[must_use]
    pub fn buffer_step(&self) -> usize {
        self.lock().config.buffer_step
    }

    /// Drop every row and release the backing buffers.
    ///
    /// Series stay registered; their observed bounds are forgotten.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.ring.clear();
        state.timestamps = Vec::new();
        for column in &mut state.series {
            column.values = Vec::new();
            column.observed = None;
        }
    }

    /// Write every retained row, oldest first, in the snapshot format.
    ///
    /// # Errors
    /// Returns [`StorageError::Io`] on write failure, or
    /// [`StorageError::TooLarge`] if a count does not fit the format.
    pub fn save_snapshot<W: Write>(&self, writer: &mut W) -> Result<(), StorageError> {
        let state = self.lock();
        let header = SnapshotHeader { series_count: state.series.len(), row_count: state.ring.len() };
        header.write(writer)?;

        for index in 0..header.row_count {
            let Some(slot) = state.ring.physical(index) else { break };
            write_i64(writer, state.timestamps[slot])?;
            for column in &state.series {
                write_i64(writer, column.values[slot])?;
            }
        }
        writer.flush()?;

        info!("Saved XY snapshot: {} series, {} rows", header.series_count, header.row_count);
        Ok(())
    }

    /// Replay a snapshot's rows through [`XyStorage::append`].
    ///
    /// Rows are appended after whatever the store already holds, with the usual
    /// growth and overwrite behavior.
    ///
    /// # Errors
    /// - [`StorageError::BadHeader`] / [`StorageError::UnsupportedVersion`] if
    ///   the envelope is wrong
    /// - [`StorageError::SeriesCountMismatch`] if the snapshot was taken with a
    ///   different number of series
    /// - [`StorageError::Io`] if the stream ends or fails mid-way; rows read
    ///   before the failure stay appended
    ///
    /// Envelope and series-count failures leave the store untouched.
    pub fn load_snapshot<R: Read>(&self, reader: &mut R) -> Result<(), StorageError> {
        let header = SnapshotHeader::read(reader)?;

        let mut state = self.lock();
        if header.series_count != state.series.len() {
            return Err(StorageError::SeriesCountMismatch {
                found: header.series_count,
                expected: state.series.len(),
            });
        }

        let mut row = vec![0i64; header.series_count];
        for _ in 0..header.row_count {
            let timestamp = read_i64(reader)?;
            for value in &mut row {
                *value = read_i64(reader)?;
            }
            state.append(timestamp, &row)?;
        }

        info!("Loaded XY snapshot: {} series, {} rows", header.series_count, header.row_count);
        Ok(())
    }
}

/// Handle to one series of an [`XyStorage`].
///
/// Reads go through the store, so they always see the current rotation.
#[derive(Debug, Clone)]
pub struct XyItem {
    storage: XyStorage,
    index: SeriesIndex,
    name: String,
    min_value: i64,
    max_value: i64,
}

impl XyItem {
    #[must_use]
    pub fn index(&self) -> SeriesIndex {
        self.index
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared minimum, used by consumers for scaling only.
    #[must_use]
    pub fn min_value(&self) -> i64 {
        self.min_value
    }

    /// Declared maximum, used by consumers for scaling only.
    #[must_use]
    pub fn max_value(&self) -> i64 {
        self.max_value
    }

    /// Declared bounds widened by every real value appended so far.
    #[must_use]
    pub fn bounds(&self) -> (i64, i64) {
        let state = self.storage.lock();
        state.series.get(self.index.0).map_or((self.min_value, self.max_value), SeriesColumn::bounds)
    }

    #[must_use]
    pub fn values_count(&self) -> usize {
        self.storage.timestamps_count()
    }

    /// Raw value at a logical row; may be [`NO_VALUE`].
    #[must_use]
    pub fn value(&self, index: usize) -> Option<i64> {
        self.storage.value(self.index, index)
    }
}
