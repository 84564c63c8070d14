//! AES-128-CTR encryption layer for spill files.
//!
//! CTR mode turns the block cipher into a seekable stream cipher: any byte
//! offset of the file can be decrypted without touching earlier bytes, which
//! is what random-access row lookups need. Segment framing happens in the
//! plaintext coordinate space; the entire framed stream is encrypted
//! byte-for-byte on its way to disk.

use std::io::Write;

use aes::Aes128;
use ctr::cipher::{KeyIvInit, StreamCipher, StreamCipherSeek};
use ctr::Ctr128BE;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::SpillError;
use crate::io::{ReadAt, ReadAtResult};

/// Bytes encrypted and written per flush unit.
pub const FLUSH_UNIT_SIZE: usize = 1024;
/// AES-128 key length in bytes.
pub const KEY_SIZE: usize = 16;
/// CTR IV length in bytes.
pub const IV_SIZE: usize = 16;

type Aes128Ctr = Ctr128BE<Aes128>;

/// Key material for one spill list, generated at creation and never
/// persisted.
#[derive(Clone)]
pub struct CipherContext {
    key: [u8; KEY_SIZE],
    iv: [u8; IV_SIZE],
}

impl CipherContext {
    /// Generates a fresh random key and IV.
    #[must_use]
    pub fn random() -> Self {
        let mut key = [0u8; KEY_SIZE];
        let mut iv = [0u8; IV_SIZE];
        OsRng.fill_bytes(&mut key);
        OsRng.fill_bytes(&mut iv);
        Self { key, iv }
    }

    /// A keystream positioned at byte `offset` of the stream.
    fn keystream_at(&self, offset: u64) -> Aes128Ctr {
        let mut cipher = Aes128Ctr::new(&self.key.into(), &self.iv.into());
        cipher.seek(offset);
        cipher
    }
}

impl std::fmt::Debug for CipherContext {
    // Key material must not end up in logs.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CipherContext").finish_non_exhaustive()
    }
}

/// Encrypting writer over the physical segment stream.
///
/// Plaintext accumulates in flush units of [`FLUSH_UNIT_SIZE`] bytes; each
/// full unit is encrypted with the running keystream and written to the
/// sink. The pending (not yet encrypted) tail stays addressable through
/// [`cache`](Self::cache), mirroring the checksum layer's pending cache one
/// level further down.
pub struct CipherWriter<W> {
    inner: W,
    ctx: CipherContext,
    buf: Vec<u8>,
    /// Stream bytes already encrypted and written; the offset at which the
    /// cache begins.
    flushed: u64,
}

impl<W: Write> CipherWriter<W> {
    /// Creates a writer encrypting into `inner` under `ctx`.
    pub fn new(inner: W, ctx: CipherContext) -> Self {
        Self {
            inner,
            ctx,
            buf: Vec::with_capacity(FLUSH_UNIT_SIZE),
            flushed: 0,
        }
    }

    fn flush_unit(&mut self) -> std::io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let mut cipher = self.ctx.keystream_at(self.flushed);
        cipher.apply_keystream(&mut self.buf);
        self.inner.write_all(&self.buf)?;
        self.flushed += self.buf.len() as u64;
        self.buf.clear();
        Ok(())
    }

    /// Pending plaintext bytes awaiting encryption.
    #[must_use]
    pub fn cache(&self) -> &[u8] {
        &self.buf
    }

    /// Stream offset at which the pending cache begins.
    #[must_use]
    pub fn cache_data_offset(&self) -> u64 {
        self.flushed
    }

    /// The key material this writer encrypts under.
    #[must_use]
    pub fn context(&self) -> &CipherContext {
        &self.ctx
    }

    /// The underlying sink.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }
}

impl<W: Write> Write for CipherWriter<W> {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        let mut rest = data;
        while !rest.is_empty() {
            let room = FLUSH_UNIT_SIZE - self.buf.len();
            let take = room.min(rest.len());
            self.buf.extend_from_slice(&rest[..take]);
            rest = &rest[take..];
            if self.buf.len() == FLUSH_UNIT_SIZE {
                self.flush_unit()?;
            }
        }
        Ok(data.len())
    }

    /// Encrypts and writes the pending partial unit, then flushes the sink.
    ///
    /// Unlike the segment layer, a partial flush here is harmless: the
    /// keystream continues mid-block, so the stream may keep growing.
    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_unit()?;
        self.inner.flush()
    }
}

/// Decrypting random-access reader over the spill file.
pub struct CipherReader<R> {
    inner: R,
    ctx: CipherContext,
}

impl<R> CipherReader<R> {
    /// Creates a reader decrypting `inner` under `ctx`.
    pub fn new(inner: R, ctx: CipherContext) -> Self {
        Self { inner, ctx }
    }
}

impl<R: ReadAt> ReadAt for CipherReader<R> {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<ReadAtResult, SpillError> {
        let r = self.inner.read_at(buf, offset)?;
        let mut cipher = self.ctx.keystream_at(offset);
        cipher.apply_keystream(&mut buf[..r.read]);
        Ok(r)
    }
}
