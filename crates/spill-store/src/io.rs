//! Positional-read and tracked-write plumbing shared by the codec layers.

use std::fs::File;
use std::io::Write;
use std::sync::Arc;

use crate::error::SpillError;
use crate::tracker::DiskUsageTracker;

/// Outcome of a bounded random-access read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadAtResult {
    /// Number of bytes copied into the destination buffer.
    pub read: usize,
    /// Whether the read hit the end of the available data before the buffer
    /// was filled.
    pub eof: bool,
}

/// Random access over a byte source.
///
/// `read_at` copies as many bytes as are available at `offset`, reporting
/// end-of-data as a distinct signal rather than an error: a short read means
/// the source ended, never that something went wrong.
pub trait ReadAt {
    /// Reads into `buf` starting at byte `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure or data corruption. Running out of
    /// data is reported through [`ReadAtResult::eof`], not as an error.
    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<ReadAtResult, SpillError>;
}

impl ReadAt for File {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<ReadAtResult, SpillError> {
        let mut filled = 0;
        while filled < buf.len() {
            match positional_read(self, &mut buf[filled..], offset + filled as u64) {
                Ok(0) => return Ok(ReadAtResult { read: filled, eof: true }),
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => return Err(SpillError::io("read", e)),
            }
        }
        Ok(ReadAtResult { read: filled, eof: false })
    }
}

#[cfg(unix)]
fn positional_read(file: &File, buf: &mut [u8], offset: u64) -> std::io::Result<usize> {
    use std::os::unix::fs::FileExt;
    FileExt::read_at(file, buf, offset)
}

#[cfg(windows)]
fn positional_read(file: &File, buf: &mut [u8], offset: u64) -> std::io::Result<usize> {
    use std::os::windows::fs::FileExt;
    file.seek_read(buf, offset)
}

/// Clonable handle over one open spill file descriptor.
///
/// Appends go through the shared cursor (single-writer discipline); reads
/// use positional I/O and never touch the cursor.
#[derive(Debug, Clone)]
pub(crate) struct SharedFile(Arc<File>);

impl SharedFile {
    pub(crate) fn new(file: File) -> Self {
        Self(Arc::new(file))
    }
}

impl Write for SharedFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        (&*self.0).write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        (&*self.0).flush()
    }
}

impl ReadAt for SharedFile {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<ReadAtResult, SpillError> {
        self.0.as_ref().read_at(buf, offset)
    }
}

/// Write sink that reports every physical write to the byte-usage tracker.
pub(crate) struct TrackedWriter<W> {
    inner: W,
    tracker: Arc<dyn DiskUsageTracker>,
    written: u64,
}

impl<W> TrackedWriter<W> {
    pub(crate) fn new(inner: W, tracker: Arc<dyn DiskUsageTracker>) -> Self {
        Self {
            inner,
            tracker,
            written: 0,
        }
    }

    /// Total bytes physically written through this sink.
    pub(crate) fn written(&self) -> u64 {
        self.written
    }
}

impl<W: Write> Write for TrackedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        self.tracker.consume(n as u64);
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
