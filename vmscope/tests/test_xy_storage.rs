use std::io::Cursor;

use vmscope::charts::{SnapshotHeader, XyStorage};
use vmscope::domain::{StorageError, NO_VALUE};

fn filled(limit: usize, step: usize, rows: i64) -> XyStorage {
    let storage = XyStorage::with_limits(limit, step).unwrap();
    storage.add_series("cpu", 0, 100);
    storage.add_series("gc", 0, 100);
    for i in 0..rows {
        storage.append(10_000 + i * 1000, &[i, -i]).unwrap();
    }
    storage
}

#[test]
fn test_rows_below_capacity_read_back_exactly() {
    let storage = filled(50, 7, 33);
    let cpu = vmscope::domain::SeriesIndex(0);
    let gc = vmscope::domain::SeriesIndex(1);

    assert_eq!(storage.timestamps_count(), 33);
    assert!(!storage.is_full());
    for i in 0..33usize {
        let n = i64::try_from(i).unwrap();
        assert_eq!(storage.timestamp(i), Some(10_000 + n * 1000));
        assert_eq!(storage.value(cpu, i), Some(n));
        assert_eq!(storage.value(gc, i), Some(-n));
    }
}

#[test]
fn test_circular_overwrite_keeps_last_capacity_rows() {
    let capacity = 16;
    let extra = 5;
    let storage = filled(capacity, 4, i64::try_from(capacity + extra).unwrap());

    assert!(storage.is_full());
    assert_eq!(storage.timestamps_count(), capacity);
    // The (extra + 1)-th appended row is now the oldest
    assert_eq!(storage.timestamp(0), Some(10_000 + 5 * 1000));
    assert_eq!(storage.timestamp(capacity - 1), Some(10_000 + 20 * 1000));
    for i in 1..capacity {
        assert!(storage.timestamp(i) > storage.timestamp(i - 1), "rows must stay oldest-first");
    }
}

#[test]
fn test_growth_is_stepwise_and_bounded() {
    let storage = XyStorage::with_limits(10, 4).unwrap();
    storage.add_series("s", 0, 1);

    let mut previous = storage.allocated_rows();
    let mut seen = Vec::new();
    for ts in 0..40 {
        storage.append(ts, &[ts]).unwrap();
        let allocated = storage.allocated_rows();
        assert!(allocated >= previous, "allocation never shrinks");
        assert!(allocated - previous <= 4, "grows at most one step per append");
        assert!(allocated <= 10, "never exceeds the values limit");
        if allocated != previous {
            seen.push(allocated);
        }
        previous = allocated;
    }
    assert_eq!(seen, vec![4, 8, 10]);
}

#[test]
fn test_snapshot_round_trip_after_wrap() {
    let source = filled(8, 3, 21);
    let mut bytes = Vec::new();
    source.save_snapshot(&mut bytes).unwrap();

    let header = SnapshotHeader::read(&mut Cursor::new(&bytes)).unwrap();
    assert_eq!(header, SnapshotHeader { series_count: 2, row_count: 8 });

    let target = XyStorage::with_limits(8, 3).unwrap();
    let cpu = target.add_series("cpu", 0, 100);
    let gc = target.add_series("gc", 0, 100);
    target.load_snapshot(&mut Cursor::new(&bytes)).unwrap();

    assert_eq!(target.timestamps_count(), source.timestamps_count());
    for i in 0..8 {
        assert_eq!(target.timestamp(i), source.timestamp(i));
        assert_eq!(cpu.value(i), source.value(cpu.index(), i));
        assert_eq!(gc.value(i), source.value(gc.index(), i));
    }
}

#[test]
fn test_snapshot_is_identical_after_round_trip() {
    let source = filled(5, 2, 12);
    let mut first = Vec::new();
    source.save_snapshot(&mut first).unwrap();

    let target = XyStorage::with_limits(5, 2).unwrap();
    target.add_series("cpu", 0, 100);
    target.add_series("gc", 0, 100);
    target.load_snapshot(&mut Cursor::new(&first)).unwrap();

    let mut second = Vec::new();
    target.save_snapshot(&mut second).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_no_value_survives_snapshot() {
    let source = XyStorage::with_limits(4, 4).unwrap();
    source.add_series("early", 0, 1);
    source.append(1, &[11]).unwrap();
    source.add_series("late", 0, 1);
    source.append(2, &[12, 22]).unwrap();

    let mut bytes = Vec::new();
    source.save_snapshot(&mut bytes).unwrap();

    let target = XyStorage::with_limits(4, 4).unwrap();
    target.add_series("early", 0, 1);
    let late = target.add_series("late", 0, 1);
    target.load_snapshot(&mut Cursor::new(bytes)).unwrap();

    assert_eq!(late.value(0), Some(NO_VALUE));
    assert_eq!(late.value(1), Some(22));
}

#[test]
fn test_load_rejects_garbage_without_mutation() {
    let target = XyStorage::with_limits(4, 4).unwrap();
    target.add_series("s", 0, 1);
    target.append(7, &[70]).unwrap();

    let err = target.load_snapshot(&mut Cursor::new(b"\x00\x03abc\x00\x00\x00\x01".to_vec())).unwrap_err();
    assert!(matches!(err, StorageError::BadHeader(_)));
    assert_eq!(target.timestamps_count(), 1);
    assert_eq!(target.timestamp(0), Some(7));
}

#[test]
fn test_reads_from_another_thread() {
    let storage = XyStorage::with_limits(64, 8).unwrap();
    let item = storage.add_series("s", 0, 1);

    let writer = {
        let storage = storage.clone();
        std::thread::spawn(move || {
            for ts in 0..1000 {
                storage.append(ts, &[ts * 2]).unwrap();
            }
        })
    };

    for _ in 0..200 {
        let count = item.values_count();
        if count > 0 {
            // Rows are written whole: a visible row always has its value
            let ts = storage.timestamp(0);
            assert!(ts.is_some());
        }
    }
    writer.join().unwrap();

    assert_eq!(storage.timestamps_count(), 64);
    assert_eq!(storage.timestamp(63), Some(999));
    assert_eq!(item.value(63), Some(1998));
}
