//! Segmented checksum framing over the spill file.
//!
//! The logical byte stream is cut into fixed-size segments; each segment is
//! written as a 4-byte CRC32C over its payload followed by up to 1020
//! payload bytes (1024 bytes framed). Segment boundaries are independent of
//! row boundaries, and only the final segment of a stream may be short.
//!
//! ```text
//!  physical stream:
//!  +----------+------------------+----------+------------------+--
//!  | crc32 4B | payload <= 1020B | crc32 4B | payload <= 1020B | ...
//!  +----------+------------------+----------+------------------+--
//!  logical:   0 ................ 1020 ..................... 2040 ...
//! ```
//!
//! [`SegmentWriter`] frames the stream on the way down; [`SegmentReader`]
//! maps logical offsets back to physical ones and verifies each segment as
//! its bytes are consumed.

mod reader;
mod writer;

pub use reader::SegmentReader;
pub use writer::SegmentWriter;

/// Maximum payload bytes per segment.
pub const MAX_PAYLOAD_SIZE: usize = 1020;
/// Bytes of checksum prefix per segment.
pub const CHECKSUM_SIZE: usize = 4;
/// Total framed size of a full segment.
pub const SEGMENT_SIZE: usize = MAX_PAYLOAD_SIZE + CHECKSUM_SIZE;
