//! End-to-end spill tests: append batches, fetch every row back by pointer,
//! with and without encryption at rest.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use spill_store::{
    Datum, DiskUsageTracker, EncryptionMethod, FieldType, RowBatch, RowPtr, SpillConfig,
    SpillError, SpillList, SPILL_FILE_PREFIX,
};
use tempfile::TempDir;

/// Tracker keeping a running balance, so tests can assert it returns to
/// baseline after close.
#[derive(Default)]
struct BalanceTracker {
    balance: AtomicI64,
}

impl BalanceTracker {
    fn balance(&self) -> i64 {
        self.balance.load(Ordering::SeqCst)
    }
}

impl DiskUsageTracker for BalanceTracker {
    fn consume(&self, delta: u64) {
        self.balance
            .fetch_add(i64::try_from(delta).unwrap(), Ordering::SeqCst);
    }

    fn release(&self, total: u64) {
        self.balance
            .fetch_sub(i64::try_from(total).unwrap(), Ordering::SeqCst);
    }
}

fn fields() -> Arc<[FieldType]> {
    Arc::from([
        FieldType::String,
        FieldType::Int64,
        FieldType::String,
        FieldType::Int64,
        FieldType::Json,
    ])
}

/// Batches in the shape of a query result: strings, integers, NULLs, and a
/// JSON column populated only in even batches.
fn build_batches(num_chunks: usize, num_rows: usize) -> Vec<RowBatch> {
    let fields = fields();
    (0..num_chunks)
        .map(|chunk| {
            let mut batch = RowBatch::new(Arc::clone(&fields));
            for row in 0..num_rows {
                let data = (chunk * num_rows + row) as i64;
                let json = if chunk % 2 == 0 {
                    Datum::Json(serde_json::Value::String(data.to_string()))
                } else {
                    Datum::Null
                };
                batch.push(vec![
                    Datum::String(data.to_string()),
                    Datum::Null,
                    Datum::Null,
                    Datum::Int64(data),
                    json,
                ]);
            }
            batch
        })
        .collect()
}

fn spill_and_check(encryption: EncryptionMethod, num_chunks: usize, num_rows: usize) {
    let dir = TempDir::new().unwrap();
    let config = SpillConfig {
        spill_dir: dir.path().to_path_buf(),
        encryption,
    };
    let tracker = Arc::new(BalanceTracker::default());
    let tracker_dyn: Arc<dyn DiskUsageTracker> = tracker.clone();
    let mut list = SpillList::new(fields(), &config, tracker_dyn).unwrap();

    let batches = build_batches(num_chunks, num_rows);
    for batch in &batches {
        list.add(batch).unwrap();
    }
    assert_eq!(list.num_chunks(), num_chunks);

    for (chunk_idx, batch) in batches.iter().enumerate() {
        for row_idx in 0..batch.num_rows() {
            let ptr = RowPtr {
                chunk_idx: chunk_idx as u32,
                row_idx: row_idx as u32,
            };
            let row = list.get_row(ptr).unwrap();
            assert_eq!(row.datums(), batch.row(row_idx).unwrap(), "{ptr:?}");
        }
    }
    list.close().unwrap();
}

#[test]
fn test_round_trip_small() {
    spill_and_check(EncryptionMethod::Plaintext, 2, 2);
    spill_and_check(EncryptionMethod::Aes128Ctr, 2, 2);
}

#[test]
fn test_round_trip_many_segments() {
    spill_and_check(EncryptionMethod::Plaintext, 10, 250);
    spill_and_check(EncryptionMethod::Aes128Ctr, 10, 250);
}

#[test]
fn test_spill_file_lifecycle() {
    let dir = TempDir::new().unwrap();
    let config = SpillConfig {
        spill_dir: dir.path().to_path_buf(),
        encryption: EncryptionMethod::Plaintext,
    };
    let tracker = Arc::new(BalanceTracker::default());
    let tracker_dyn: Arc<dyn DiskUsageTracker> = tracker.clone();
    let mut list = SpillList::new(fields(), &config, tracker_dyn).unwrap();

    // The spill file exists in the configured directory under the
    // recognizable prefix.
    let spill_files = || {
        std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with(SPILL_FILE_PREFIX))
            .count()
    };
    assert_eq!(spill_files(), 1);

    // Enough data to force physical flushes.
    for batch in build_batches(4, 200) {
        list.add(&batch).unwrap();
    }
    assert!(list.disk_bytes() > 0);
    assert!(tracker.balance() > 0);

    list.close().unwrap();
    assert_eq!(spill_files(), 0);
    assert_eq!(tracker.balance(), 0);

    // The list is terminal after close.
    assert!(matches!(
        list.get_row(RowPtr { chunk_idx: 0, row_idx: 0 }),
        Err(SpillError::ListClosed)
    ));
    assert!(matches!(list.close(), Err(SpillError::ListClosed)));
}

#[test]
fn test_reads_interleaved_with_writes() {
    let dir = TempDir::new().unwrap();
    let config = SpillConfig {
        spill_dir: dir.path().to_path_buf(),
        encryption: EncryptionMethod::Aes128Ctr,
    };
    let tracker: Arc<dyn DiskUsageTracker> = Arc::new(BalanceTracker::default());
    let mut list = SpillList::new(fields(), &config, tracker).unwrap();

    let batches = build_batches(6, 40);
    for (added, batch) in batches.iter().enumerate() {
        list.add(batch).unwrap();
        // Every already-appended chunk stays readable after each write,
        // including rows still sitting in the pending caches.
        for chunk_idx in 0..=added {
            let row = list
                .get_row(RowPtr {
                    chunk_idx: chunk_idx as u32,
                    row_idx: 0,
                })
                .unwrap();
            assert_eq!(row.datums(), batches[chunk_idx].row(0).unwrap());
        }
    }
    list.close().unwrap();
}

#[test]
fn test_out_of_range() {
    let dir = TempDir::new().unwrap();
    let config = SpillConfig {
        spill_dir: dir.path().to_path_buf(),
        encryption: EncryptionMethod::Plaintext,
    };
    let tracker: Arc<dyn DiskUsageTracker> = Arc::new(BalanceTracker::default());
    let mut list = SpillList::new(fields(), &config, tracker).unwrap();
    list.add(&build_batches(1, 3)[0]).unwrap();

    assert!(list.get_row(RowPtr { chunk_idx: 0, row_idx: 2 }).is_ok());
    assert!(matches!(
        list.get_row(RowPtr { chunk_idx: 0, row_idx: 3 }),
        Err(SpillError::OutOfRange { .. })
    ));
    assert!(matches!(
        list.get_row(RowPtr { chunk_idx: 9, row_idx: 0 }),
        Err(SpillError::OutOfRange { .. })
    ));
    list.close().unwrap();
}
