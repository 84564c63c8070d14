//! Configuration for spill lists.

use std::path::PathBuf;

/// Encryption applied to spill files at rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncryptionMethod {
    /// No encryption; framed segments are written as-is.
    #[default]
    Plaintext,
    /// AES-128 in CTR mode, keyed per list at creation time.
    Aes128Ctr,
}

/// Configuration for a [`SpillList`](crate::SpillList).
#[derive(Debug, Clone)]
pub struct SpillConfig {
    /// Directory spill files are created in.
    pub spill_dir: PathBuf,
    /// Encryption applied to spill files.
    pub encryption: EncryptionMethod,
}

impl Default for SpillConfig {
    fn default() -> Self {
        Self {
            spill_dir: std::env::temp_dir(),
            encryption: EncryptionMethod::Plaintext,
        }
    }
}
