//! Error types for spill-store operations.

/// Errors that can occur while spilling rows to disk or reading them back.
#[derive(Debug, thiserror::Error)]
pub enum SpillError {
    /// I/O error from the underlying spill file.
    #[error("I/O error during {op}: {source}")]
    Io {
        /// Operation that performed the I/O (`add`, `get_row`, `close`, ...).
        op: &'static str,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A segment's stored checksum disagrees with its payload.
    #[error("checksum mismatch in segment at physical offset {offset}: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch {
        /// Physical offset of the corrupted segment.
        offset: u64,
        /// Checksum stored in the segment header.
        expected: u32,
        /// Checksum computed over the segment payload.
        actual: u32,
    },

    /// A row record could not be parsed from its byte range.
    #[error("corrupt row record: {0}")]
    CorruptRecord(String),

    /// A row pointer references a nonexistent chunk or row.
    #[error("row pointer out of range: chunk {chunk_idx}, row {row_idx}")]
    OutOfRange {
        /// Chunk index of the offending pointer.
        chunk_idx: u32,
        /// Row index of the offending pointer.
        row_idx: u32,
    },

    /// Operation attempted after the list was closed.
    #[error("spill list is closed")]
    ListClosed,
}

impl SpillError {
    /// Wraps an I/O error with the operation that produced it.
    pub(crate) fn io(op: &'static str, source: std::io::Error) -> Self {
        Self::Io { op, source }
    }
}
