//! Checksummed segment writer.

use std::io::Write;

use super::MAX_PAYLOAD_SIZE;

/// Writes a logical byte stream as checksummed segments.
///
/// Bytes accumulate in the current segment's payload buffer; each time the
/// buffer reaches [`MAX_PAYLOAD_SIZE`] the segment is framed (CRC32C +
/// payload) and emitted to the sink. The pending payload stays addressable
/// through [`cache`](Self::cache) so readers can observe bytes that have not
/// been framed yet.
pub struct SegmentWriter<W> {
    inner: W,
    buf: Vec<u8>,
    /// Logical bytes already framed; the offset at which the cache begins.
    flushed: u64,
    /// Set once a short segment has been emitted; the stream must not grow
    /// past it, a short mid-stream segment breaks reader offset arithmetic.
    sealed: bool,
}

impl<W: Write> SegmentWriter<W> {
    /// Creates a writer framing into `inner`.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            buf: Vec::with_capacity(MAX_PAYLOAD_SIZE),
            flushed: 0,
            sealed: false,
        }
    }

    /// Appends `data` to the logical stream.
    ///
    /// # Errors
    ///
    /// Returns the sink's I/O error, or `InvalidInput` when the stream was
    /// sealed by a partial-segment [`flush`](Self::flush).
    pub fn write_all(&mut self, mut data: &[u8]) -> std::io::Result<()> {
        if self.sealed {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "segment stream is sealed by a partial-segment flush",
            ));
        }
        while !data.is_empty() {
            let room = MAX_PAYLOAD_SIZE - self.buf.len();
            let take = room.min(data.len());
            self.buf.extend_from_slice(&data[..take]);
            data = &data[take..];
            if self.buf.len() == MAX_PAYLOAD_SIZE {
                self.emit()?;
            }
        }
        Ok(())
    }

    /// Forces the pending partial payload out as a short final segment and
    /// flushes the sink.
    ///
    /// Guarantees every logical byte is physically present in the sink.
    /// Emitting a short segment seals the stream: subsequent writes fail.
    /// Ordinary lookups do not need this, they read the pending tail through
    /// the writer cache.
    ///
    /// # Errors
    ///
    /// Returns the sink's I/O error.
    pub fn flush(&mut self) -> std::io::Result<()> {
        if !self.buf.is_empty() {
            self.emit()?;
            self.sealed = true;
        }
        self.inner.flush()
    }

    fn emit(&mut self) -> std::io::Result<()> {
        let crc = crc32c::crc32c(&self.buf);
        self.inner.write_all(&crc.to_le_bytes())?;
        self.inner.write_all(&self.buf)?;
        self.flushed += self.buf.len() as u64;
        self.buf.clear();
        Ok(())
    }

    /// Pending payload bytes of the in-progress segment.
    #[must_use]
    pub fn cache(&self) -> &[u8] {
        &self.buf
    }

    /// Logical stream offset at which the pending cache begins.
    #[must_use]
    pub fn cache_data_offset(&self) -> u64 {
        self.flushed
    }

    /// The underlying sink.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }
}
