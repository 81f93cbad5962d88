//! XY snapshot envelope and primitive codec.
//!
//! Layout (all integers big-endian):
//!
//! ```text
//! u16 length + bytes   "XYStorageSnapshot"
//! i32                  format version (1)
//! i32                  series count
//! i32                  row count
//! row count times:     i64 timestamp, then one i64 per series
//! ```
//!
//! Rows are always written oldest first, so the file does not depend on where
//! the ring happened to be rotated when it was saved.

use std::io::{self, Read, Write};

use crate::domain::StorageError;
use vmscope_common::{SNAPSHOT_HEADER, SNAPSHOT_VERSION};

/// Counts read from (or written to) the start of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotHeader {
    pub series_count: usize,
    pub row_count: usize,
}

impl SnapshotHeader {
    /// Read and validate the envelope, leaving the reader at the first row.
    ///
    /// # Errors
    /// - [`StorageError::BadHeader`] if the tag is not the XY snapshot tag
    /// - [`StorageError::UnsupportedVersion`] for any other format version
    /// - [`StorageError::NegativeCount`] if a count is negative
    /// - [`StorageError::Io`] if the stream ends early
    pub fn read<R: Read>(reader: &mut R) -> Result<Self, StorageError> {
        let tag = read_utf(reader)?;
        if tag != SNAPSHOT_HEADER {
            return Err(StorageError::BadHeader(tag));
        }

        let version = read_i32(reader)?;
        if version != SNAPSHOT_VERSION {
            return Err(StorageError::UnsupportedVersion { found: version, expected: SNAPSHOT_VERSION });
        }

        let series_count = read_count(reader)?;
        let row_count = read_count(reader)?;
        Ok(Self { series_count, row_count })
    }

    /// Write the envelope.
    ///
    /// # Errors
    /// Returns [`StorageError::TooLarge`] if a count does not fit an `i32`.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<(), StorageError> {
        write_utf(writer, SNAPSHOT_HEADER)?;
        write_i32(writer, SNAPSHOT_VERSION)?;
        write_i32(writer, encode_count(self.series_count, "series count")?)?;
        write_i32(writer, encode_count(self.row_count, "row count")?)?;
        Ok(())
    }
}

fn read_count<R: Read>(reader: &mut R) -> Result<usize, StorageError> {
    let count = read_i32(reader)?;
    usize::try_from(count).map_err(|_| StorageError::NegativeCount(count))
}

fn encode_count(count: usize, what: &str) -> Result<i32, StorageError> {
    i32::try_from(count).map_err(|_| StorageError::TooLarge(format!("{what} {count}")))
}

/// Length-prefixed string, two-byte big-endian length.
pub(crate) fn write_utf<W: Write>(writer: &mut W, value: &str) -> Result<(), StorageError> {
    let bytes = value.as_bytes();
    let len = u16::try_from(bytes.len())
        .map_err(|_| StorageError::TooLarge(format!("string of {} bytes", bytes.len())))?;
    writer.write_all(&len.to_be_bytes())?;
    writer.write_all(bytes)?;
    Ok(())
}

pub(crate) fn read_utf<R: Read>(reader: &mut R) -> Result<String, StorageError> {
    let mut len = [0u8; 2];
    reader.read_exact(&mut len)?;
    let mut bytes = vec![0u8; usize::from(u16::from_be_bytes(len))];
    reader.read_exact(&mut bytes)?;
    // Anything that is not valid UTF-8 cannot be our tag anyway
    String::from_utf8(bytes).map_err(|e| StorageError::BadHeader(String::from_utf8_lossy(e.as_bytes()).into_owned()))
}

pub(crate) fn write_i32<W: Write>(writer: &mut W, value: i32) -> io::Result<()> {
    writer.write_all(&value.to_be_bytes())
}

pub(crate) fn read_i32<R: Read>(reader: &mut R) -> io::Result<i32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(i32::from_be_bytes(buf))
}

pub(crate) fn write_i64<W: Write>(writer: &mut W, value: i64) -> io::Result<()> {
    writer.write_all(&value.to_be_bytes())
}

pub(crate) fn read_i64<R: Read>(reader: &mut R) -> io::Result<i64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(i64::from_be_bytes(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_header_bytes_are_exact() {
        let mut buf = Vec::new();
        SnapshotHeader { series_count: 2, row_count: 3 }.write(&mut buf).unwrap();

        let mut expected = vec![0x00, 0x11];
        expected.extend_from_slice(b"XYStorageSnapshot");
        expected.extend_from_slice(&[0, 0, 0, 1]);
        expected.extend_from_slice(&[0, 0, 0, 2]);
        expected.extend_from_slice(&[0, 0, 0, 3]);
        assert_eq!(buf, expected);
    }

    #[test]
    fn test_header_read_back() {
        let mut buf = Vec::new();
        SnapshotHeader { series_count: 4, row_count: 0 }.write(&mut buf).unwrap();
        let header = SnapshotHeader::read(&mut Cursor::new(buf)).unwrap();
        assert_eq!(header, SnapshotHeader { series_count: 4, row_count: 0 });
    }

    #[test]
    fn test_rejects_wrong_tag() {
        let mut buf = Vec::new();
        write_utf(&mut buf, "SomethingElse").unwrap();
        write_i32(&mut buf, 1).unwrap();
        let err = SnapshotHeader::read(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, StorageError::BadHeader(ref tag) if tag == "SomethingElse"));
    }

    #[test]
    fn test_rejects_wrong_version() {
        let mut buf = Vec::new();
        write_utf(&mut buf, SNAPSHOT_HEADER).unwrap();
        write_i32(&mut buf, 2).unwrap();
        let err = SnapshotHeader::read(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, StorageError::UnsupportedVersion { found: 2, expected: 1 }));
    }

    #[test]
    fn test_rejects_negative_counts() {
        let mut buf = Vec::new();
        write_utf(&mut buf, SNAPSHOT_HEADER).unwrap();
        write_i32(&mut buf, SNAPSHOT_VERSION).unwrap();
        write_i32(&mut buf, 1).unwrap();
        write_i32(&mut buf, -5).unwrap();
        let err = SnapshotHeader::read(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, StorageError::NegativeCount(-5)));
    }

    #[test]
    fn test_truncated_stream_is_io_error() {
        let err = SnapshotHeader::read(&mut Cursor::new(vec![0x00])).unwrap_err();
        assert!(matches!(err, StorageError::Io(_)));
    }

    #[test]
    fn test_i64_is_big_endian() {
        let mut buf = Vec::new();
        write_i64(&mut buf, 0x0102_0304_0506_0708).unwrap();
        assert_eq!(buf, vec![1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(read_i64(&mut Cursor::new(buf)).unwrap(), 0x0102_0304_0506_0708);
    }
}
