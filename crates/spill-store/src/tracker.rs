//! Byte-usage accounting interface.

/// External accounting sink for spill-file disk consumption.
///
/// The spill store only reports, it never decides: bytes are consumed on
/// every physical flush to the spill file and released in full when the
/// owning list is closed or dropped. Implementations belong to the
/// surrounding engine (quota enforcement, metrics, operator dashboards).
pub trait DiskUsageTracker: Send + Sync {
    /// Records `delta` additional bytes written to disk.
    fn consume(&self, delta: u64);

    /// Returns `total` previously consumed bytes (called once per list, at
    /// close time).
    fn release(&self, total: u64);
}
