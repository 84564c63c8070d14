//! Cached random-access reader.

use crate::error::SpillError;
use crate::io::{ReadAt, ReadAtResult};

/// Serves a logical byte range from either a persistent reader or the
/// in-memory pending tail of the corresponding writer.
///
/// Persistent data covers `[0, cache_offset)`; the cache covers
/// `[cache_offset, cache_offset + cache.len())`. One instance is composed
/// per buffering layer (checksum framing, and the cipher layer when
/// enabled), which is what lets a lookup observe bytes that were appended
/// but never physically flushed.
pub struct CachedReader<R> {
    inner: R,
    cache: Vec<u8>,
    cache_offset: u64,
}

impl<R> CachedReader<R> {
    /// Composes `inner` (covering `[0, cache_offset)`) with a snapshot of
    /// the writer's pending tail.
    pub fn new(inner: R, cache: Vec<u8>, cache_offset: u64) -> Self {
        Self {
            inner,
            cache,
            cache_offset,
        }
    }
}

impl<R: ReadAt> ReadAt for CachedReader<R> {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<ReadAtResult, SpillError> {
        let cache_end = self.cache_offset + self.cache.len() as u64;

        if offset >= self.cache_offset {
            // Entirely at or past the cache start.
            if offset >= cache_end {
                return Ok(ReadAtResult { read: 0, eof: true });
            }
            #[allow(clippy::cast_possible_truncation)] // bounded by cache.len()
            let begin = (offset - self.cache_offset) as usize;
            let take = buf.len().min(self.cache.len() - begin);
            buf[..take].copy_from_slice(&self.cache[begin..begin + take]);
            return Ok(ReadAtResult {
                read: take,
                eof: take < buf.len(),
            });
        }

        if offset + buf.len() as u64 <= self.cache_offset {
            // Entirely within the persistent range.
            return self.inner.read_at(buf, offset);
        }

        // Spans the flush boundary: persistent portion first, then the cache.
        #[allow(clippy::cast_possible_truncation)] // bounded by buf.len()
        let split = (self.cache_offset - offset) as usize;
        let persistent = self.inner.read_at(&mut buf[..split], offset)?;
        if persistent.read < split {
            return Ok(persistent);
        }
        let take = (buf.len() - split).min(self.cache.len());
        buf[split..split + take].copy_from_slice(&self.cache[..take]);
        Ok(ReadAtResult {
            read: split + take,
            eof: split + take < buf.len(),
        })
    }
}
