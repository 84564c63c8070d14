//! Disk-spill row list.
//!
//! [`SpillList`] appends batches of rows to a temporary file through the
//! layered codec stack and serves point lookups by [`RowPtr`]. Offsets are
//! tracked in the logical (unframed, unencrypted) coordinate space; the
//! framing and cipher layers are invisible to callers.

use std::sync::Arc;

use parking_lot::Mutex;
use tempfile::NamedTempFile;

use crate::cache::CachedReader;
use crate::cipher::{CipherContext, CipherReader, CipherWriter};
use crate::codec::{decode_row, encode_row};
use crate::config::{EncryptionMethod, SpillConfig};
use crate::error::SpillError;
use crate::io::{ReadAt, SharedFile, TrackedWriter};
use crate::row::{FieldType, Row, RowBatch};
use crate::segment::{SegmentReader, SegmentWriter};
use crate::tracker::DiskUsageTracker;

/// Filename prefix of spill files, visible to operators and cleanup tooling.
pub const SPILL_FILE_PREFIX: &str = "spill-store-";

/// Stable logical address of a row previously appended to a [`SpillList`].
///
/// Valid only for the lifetime of the owning list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowPtr {
    /// Index of the batch the row was appended in.
    pub chunk_idx: u32,
    /// Index of the row within its batch.
    pub row_idx: u32,
}

type Sink = TrackedWriter<SharedFile>;

/// Write-side layer stack, branched once at construction.
enum WriterChain {
    Plain(SegmentWriter<Sink>),
    Encrypted(SegmentWriter<CipherWriter<Sink>>),
}

impl WriterChain {
    fn write_all(&mut self, data: &[u8]) -> std::io::Result<()> {
        match self {
            WriterChain::Plain(w) => w.write_all(data),
            WriterChain::Encrypted(w) => w.write_all(data),
        }
    }

    /// Bytes physically written to the spill file so far.
    fn disk_bytes(&self) -> u64 {
        match self {
            WriterChain::Plain(w) => w.get_ref().written(),
            WriterChain::Encrypted(w) => w.get_ref().get_ref().written(),
        }
    }
}

/// Read-side layer stack mirroring [`WriterChain`].
enum ReaderChain {
    Plain(CachedReader<SegmentReader<SharedFile>>),
    Encrypted(CachedReader<SegmentReader<CachedReader<CipherReader<SharedFile>>>>),
}

impl ReadAt for ReaderChain {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<crate::io::ReadAtResult, SpillError> {
        match self {
            ReaderChain::Plain(r) => r.read_at(buf, offset),
            ReaderChain::Encrypted(r) => r.read_at(buf, offset),
        }
    }
}

/// Cached reader chain plus its staleness state, guarded as one unit.
struct ReaderSlot {
    stale: bool,
    chain: Option<ReaderChain>,
    rebuilds: u64,
}

/// Disk-backed list of row batches addressed by [`RowPtr`].
///
/// Appends are single-writer (`&mut self`); lookups may run concurrently,
/// racing only on the reader slot, which is rebuilt at most once per
/// intervening write.
pub struct SpillList {
    fields: Arc<[FieldType]>,
    /// Per-batch logical start offsets: `offsets[chunk][row]`.
    offsets: Vec<Vec<u64>>,
    /// Logical bytes written so far.
    write_offset: u64,
    writer: WriterChain,
    file: SharedFile,
    temp: Option<NamedTempFile>,
    tracker: Arc<dyn DiskUsageTracker>,
    reader: Mutex<ReaderSlot>,
    encode_buf: Vec<u8>,
    closed: bool,
}

impl SpillList {
    /// Creates an empty spill list over `fields`, allocating a uniquely
    /// named temp file in the configured spill directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the temp file cannot be created.
    pub fn new(
        fields: Arc<[FieldType]>,
        config: &SpillConfig,
        tracker: Arc<dyn DiskUsageTracker>,
    ) -> Result<Self, SpillError> {
        let temp = tempfile::Builder::new()
            .prefix(SPILL_FILE_PREFIX)
            .tempfile_in(&config.spill_dir)
            .map_err(|e| SpillError::io("create", e))?;
        let file = SharedFile::new(
            temp.as_file()
                .try_clone()
                .map_err(|e| SpillError::io("create", e))?,
        );
        let sink = TrackedWriter::new(file.clone(), Arc::clone(&tracker));
        let writer = match config.encryption {
            EncryptionMethod::Plaintext => WriterChain::Plain(SegmentWriter::new(sink)),
            EncryptionMethod::Aes128Ctr => WriterChain::Encrypted(SegmentWriter::new(
                CipherWriter::new(sink, CipherContext::random()),
            )),
        };
        tracing::debug!(
            path = %temp.path().display(),
            encrypted = matches!(writer, WriterChain::Encrypted(_)),
            "created spill file"
        );

        Ok(Self {
            fields,
            offsets: Vec::new(),
            write_offset: 0,
            writer,
            file,
            temp: Some(temp),
            tracker,
            reader: Mutex::new(ReaderSlot {
                stale: true,
                chain: None,
                rebuilds: 0,
            }),
            encode_buf: Vec::new(),
            closed: false,
        })
    }

    /// Appends all rows of `batch`, in order, as the next chunk.
    ///
    /// On failure the rows of earlier chunks stay readable, but the
    /// partially written batch is not; the list must be closed and
    /// discarded rather than retried.
    ///
    /// # Errors
    ///
    /// Fails with `ListClosed` after [`close`](Self::close), otherwise
    /// propagates the underlying I/O error.
    pub fn add(&mut self, batch: &RowBatch) -> Result<(), SpillError> {
        if self.closed {
            return Err(SpillError::ListClosed);
        }
        debug_assert_eq!(batch.fields(), &*self.fields, "batch schema mismatch");

        let mut table = Vec::with_capacity(batch.num_rows());
        for row in batch.rows() {
            table.push(self.write_offset);
            self.encode_buf.clear();
            encode_row(row, &self.fields, &mut self.encode_buf)?;
            self.writer
                .write_all(&self.encode_buf)
                .map_err(|e| SpillError::io("add", e))?;
            self.write_offset += self.encode_buf.len() as u64;
        }
        self.offsets.push(table);
        self.reader.lock().stale = true;
        Ok(())
    }

    /// Fetches one row by pointer, decoding it into an owned [`Row`].
    ///
    /// # Errors
    ///
    /// Fails with `OutOfRange` for a pointer outside the list, `ListClosed`
    /// after close, `ChecksumMismatch`/`CorruptRecord` on corrupted data,
    /// and propagates underlying I/O errors.
    pub fn get_row(&self, ptr: RowPtr) -> Result<Row, SpillError> {
        if self.closed {
            return Err(SpillError::ListClosed);
        }
        let out_of_range = || SpillError::OutOfRange {
            chunk_idx: ptr.chunk_idx,
            row_idx: ptr.row_idx,
        };
        let chunk = self
            .offsets
            .get(ptr.chunk_idx as usize)
            .ok_or_else(out_of_range)?;
        let start = *chunk.get(ptr.row_idx as usize).ok_or_else(out_of_range)?;
        let end = self.row_end(ptr, chunk);

        let mut slot = self.reader.lock();
        if slot.stale {
            slot.chain = None;
            slot.stale = false;
        }
        let ReaderSlot { chain, rebuilds, .. } = &mut *slot;
        let chain = chain.get_or_insert_with(|| {
            *rebuilds += 1;
            self.build_reader_chain()
        });

        #[allow(clippy::cast_possible_truncation)] // row records are far below usize::MAX
        let len = (end - start) as usize;
        let mut buf = vec![0u8; len];
        let result = chain.read_at(&mut buf, start).map_err(|e| match e {
            SpillError::Io { source, .. } => SpillError::io("get_row", source),
            other => other,
        })?;
        drop(slot);

        if result.read < len {
            return Err(SpillError::CorruptRecord(format!(
                "row range [{start}, {end}) truncated: got {} of {len} bytes",
                result.read
            )));
        }
        decode_row(&buf, &self.fields)
    }

    /// Number of batches appended so far.
    #[must_use]
    pub fn num_chunks(&self) -> usize {
        self.offsets.len()
    }

    /// Number of rows in chunk `chunk_idx`, or `None` when out of range.
    #[must_use]
    pub fn num_rows_of_chunk(&self, chunk_idx: usize) -> Option<usize> {
        self.offsets.get(chunk_idx).map(Vec::len)
    }

    /// The schema shared by all rows of this list.
    #[must_use]
    pub fn fields(&self) -> &[FieldType] {
        &self.fields
    }

    /// Bytes physically written to the spill file so far.
    ///
    /// Lags the logical append position while data sits in the pending
    /// caches; this is the amount reported to the byte-usage tracker.
    #[must_use]
    pub fn disk_bytes(&self) -> u64 {
        self.writer.disk_bytes()
    }

    /// How many times the cached reader chain has been (re)built.
    ///
    /// Diagnostic: stays constant across lookups and grows by exactly one
    /// for the first lookup after a write.
    #[must_use]
    pub fn reader_rebuilds(&self) -> u64 {
        self.reader.lock().rebuilds
    }

    /// Deletes the spill file and releases all tracked disk bytes.
    ///
    /// The list transitions to its terminal state; every subsequent call,
    /// including another `close`, fails with `ListClosed`.
    ///
    /// # Errors
    ///
    /// Fails with `ListClosed` when already closed; propagates the error of
    /// removing the temp file.
    pub fn close(&mut self) -> Result<(), SpillError> {
        if self.closed {
            return Err(SpillError::ListClosed);
        }
        self.closed = true;
        self.reader.get_mut().chain = None;

        let released = self.writer.disk_bytes();
        self.tracker.release(released);
        tracing::debug!(bytes = released, "closed spill list");

        if let Some(temp) = self.temp.take() {
            temp.close().map_err(|e| SpillError::io("close", e))?;
        }
        Ok(())
    }

    /// Logical end offset of the row at `ptr`: the next offset in its
    /// chunk, the first offset of a later chunk, or the write cursor.
    fn row_end(&self, ptr: RowPtr, chunk: &[u64]) -> u64 {
        if let Some(next) = chunk.get(ptr.row_idx as usize + 1) {
            return *next;
        }
        for later in &self.offsets[ptr.chunk_idx as usize + 1..] {
            if let Some(first) = later.first() {
                return *first;
            }
        }
        self.write_offset
    }

    /// Composes the reader stack over the current writer caches; mirrors
    /// the writer chain layer for layer.
    fn build_reader_chain(&self) -> ReaderChain {
        match &self.writer {
            WriterChain::Plain(seg) => ReaderChain::Plain(CachedReader::new(
                SegmentReader::new(self.file.clone()),
                seg.cache().to_vec(),
                seg.cache_data_offset(),
            )),
            WriterChain::Encrypted(seg) => {
                let cipher = seg.get_ref();
                let decrypted = CipherReader::new(self.file.clone(), cipher.context().clone());
                let physical =
                    CachedReader::new(decrypted, cipher.cache().to_vec(), cipher.cache_data_offset());
                ReaderChain::Encrypted(CachedReader::new(
                    SegmentReader::new(physical),
                    seg.cache().to_vec(),
                    seg.cache_data_offset(),
                ))
            }
        }
    }
}

impl Drop for SpillList {
    fn drop(&mut self) {
        if !self.closed {
            // The temp file is removed by its own handle; only the tracker
            // balance needs settling here.
            self.tracker.release(self.writer.disk_bytes());
        }
    }
}
