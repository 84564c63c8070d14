//! Shared helpers for unit tests.

use std::sync::atomic::{AtomicI64, Ordering};

use crate::error::SpillError;
use crate::io::{ReadAt, ReadAtResult};
use crate::tracker::DiskUsageTracker;

/// In-memory byte source for exercising readers without a file.
pub(crate) struct ByteSource(pub(crate) Vec<u8>);

impl ReadAt for ByteSource {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<ReadAtResult, SpillError> {
        let offset = usize::try_from(offset).unwrap();
        if offset >= self.0.len() {
            return Ok(ReadAtResult { read: 0, eof: true });
        }
        let available = &self.0[offset..];
        let take = buf.len().min(available.len());
        buf[..take].copy_from_slice(&available[..take]);
        Ok(ReadAtResult {
            read: take,
            eof: take < buf.len(),
        })
    }
}

/// Tracker that keeps a running consumed-bytes balance.
#[derive(Default)]
pub(crate) struct CountingTracker {
    balance: AtomicI64,
}

impl CountingTracker {
    pub(crate) fn consumed(&self) -> i64 {
        self.balance.load(Ordering::SeqCst)
    }
}

impl DiskUsageTracker for CountingTracker {
    fn consume(&self, delta: u64) {
        self.balance.fetch_add(i64::try_from(delta).unwrap(), Ordering::SeqCst);
    }

    fn release(&self, total: u64) {
        self.balance.fetch_sub(i64::try_from(total).unwrap(), Ordering::SeqCst);
    }
}
