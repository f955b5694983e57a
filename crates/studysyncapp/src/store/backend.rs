use crate::error::Result;
use std::path::PathBuf;

/// Abstract interface for raw blob storage.
///
/// This trait handles the "how" of persistence (filesystem vs memory), while
/// `CollectionStore` handles the "what" (server round-trips, ordering,
/// reconciliation). Blobs are opaque strings addressed by key; each collection
/// store owns exactly one key.
pub trait StorageBackend {
    /// Read a blob. Returns Ok(None) when nothing has been stored under `key`.
    /// Returns Err only on actual I/O errors (permissions, disk failure).
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// Replace the blob stored under `key`.
    /// MUST be atomic (e.g. write to tmp then rename) to avoid partial writes.
    fn save(&self, key: &str, blob: &str) -> Result<()>;

    /// Where the blob lives. Real path for FsBackend, a virtual one for MemBackend.
    fn location(&self, key: &str) -> PathBuf;
}
