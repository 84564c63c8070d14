//! # Spill Store
//!
//! Disk-spill row store for query engines. When an in-memory result set
//! exceeds its memory budget, rows are appended to a temporary file and
//! fetched back by stable logical pointers, transparently integrity-checked
//! and optionally encrypted at rest.
//!
//! ## Architecture
//!
//! ```text
//!   add(batch)                              get_row(ptr)
//!       │                                        │
//!       ▼                                        ▼
//!   row codec                             offset lookup
//!       │                                        │
//!       ▼                                        ▼
//!  SegmentWriter ──┐                     CachedReader ── pending payload
//!  (CRC32C frame)  │                          │
//!       ▼          │ pending                  ▼
//!  [CipherWriter]  │ caches              SegmentReader ── verify CRC32C
//!  (AES-128-CTR)   │                          │
//!       ▼          │                          ▼
//!   temp file ◄────┘             [CachedReader ── CipherReader] ── temp file
//! ```
//!
//! Both buffering layers expose their pending tail through a
//! [`cache::CachedReader`], so a lookup can observe bytes that were appended
//! but never physically flushed. A write marks the cached reader chain stale;
//! the next lookup rebuilds it exactly once.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use spill_store::{
//!     Datum, DiskUsageTracker, FieldType, RowBatch, RowPtr, SpillConfig, SpillList,
//! };
//!
//! struct NullTracker;
//! impl DiskUsageTracker for NullTracker {
//!     fn consume(&self, _delta: u64) {}
//!     fn release(&self, _total: u64) {}
//! }
//!
//! # fn main() -> Result<(), spill_store::SpillError> {
//! let fields: Arc<[FieldType]> = Arc::from([FieldType::String, FieldType::Int64]);
//! let mut batch = RowBatch::new(Arc::clone(&fields));
//! batch.push(vec![Datum::String("spilled".into()), Datum::Int64(42)]);
//!
//! let mut list = SpillList::new(fields, &SpillConfig::default(), Arc::new(NullTracker))?;
//! list.add(&batch)?;
//! let row = list.get_row(RowPtr { chunk_idx: 0, row_idx: 0 })?;
//! assert_eq!(row.get(1), Some(&Datum::Int64(42)));
//! list.close()?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod cipher;
mod codec;
pub mod config;
pub mod error;
pub mod io;
mod list;
pub mod row;
pub mod segment;
pub mod tracker;

#[cfg(test)]
mod testutil;

pub use config::{EncryptionMethod, SpillConfig};
pub use error::SpillError;
pub use list::{RowPtr, SpillList, SPILL_FILE_PREFIX};
pub use row::{Datum, FieldType, Row, RowBatch};
pub use tracker::DiskUsageTracker;
