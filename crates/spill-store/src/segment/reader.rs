//! Checksum-verifying segment reader.

use crate::error::SpillError;
use crate::io::{ReadAt, ReadAtResult};

use super::{CHECKSUM_SIZE, MAX_PAYLOAD_SIZE, SEGMENT_SIZE};

/// Random-access reader over the framed segment stream, addressed in the
/// unframed (logical) coordinate space.
///
/// A logical offset maps to `segment * 1024 + 4 + offset_in_segment`
/// physically. Each segment's checksum is verified when its bytes are
/// consumed; reads crossing a segment boundary continue into the next
/// segment transparently. Arbitrary, overlapping, repeated reads over the
/// same source are supported.
pub struct SegmentReader<R> {
    inner: R,
}

impl<R> SegmentReader<R> {
    /// Creates a reader over the physical segment stream `inner`.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: ReadAt> ReadAt for SegmentReader<R> {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<ReadAtResult, SpillError> {
        let mut segment = offset / MAX_PAYLOAD_SIZE as u64;
        #[allow(clippy::cast_possible_truncation)] // remainder < MAX_PAYLOAD_SIZE
        let mut in_segment = (offset % MAX_PAYLOAD_SIZE as u64) as usize;
        let mut copied = 0;
        let mut frame = [0u8; SEGMENT_SIZE];

        while copied < buf.len() {
            let physical = segment * SEGMENT_SIZE as u64;
            let r = self.inner.read_at(&mut frame, physical)?;
            if r.read <= CHECKSUM_SIZE {
                // No payload at this offset: the stream ends here.
                return Ok(ReadAtResult { read: copied, eof: true });
            }

            let stored = u32::from_le_bytes([frame[0], frame[1], frame[2], frame[3]]);
            let payload = &frame[CHECKSUM_SIZE..r.read];
            let actual = crc32c::crc32c(payload);
            if stored != actual {
                return Err(SpillError::ChecksumMismatch {
                    offset: physical,
                    expected: stored,
                    actual,
                });
            }

            if in_segment >= payload.len() {
                return Ok(ReadAtResult { read: copied, eof: true });
            }
            let take = (buf.len() - copied).min(payload.len() - in_segment);
            buf[copied..copied + take].copy_from_slice(&payload[in_segment..in_segment + take]);
            copied += take;
            in_segment = 0;

            if r.eof && r.read < SEGMENT_SIZE && copied < buf.len() {
                // Short final segment with the request still unsatisfied.
                return Ok(ReadAtResult { read: copied, eof: true });
            }
            segment += 1;
        }
        Ok(ReadAtResult { read: copied, eof: false })
    }
}
