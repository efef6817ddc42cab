// Metadata Store Abstraction
//
// Defines the durability contract for metadata and log objects.
// Implementations may persist to object storage, databases, local disk, etc.
//
// Properties required from implementations:
// - Atomic create-or-fail on put (no silent overwrite)
// - Read-after-write consistency
// - No in-place mutation of stored bytes
//
// The create-or-fail semantics of `put` are the kernel's only
// mutual-exclusion primitive: the first writer of a key wins.

use crate::error::Result;

mod memory;

pub use memory::InMemoryStore;

/// Storage backend for immutable metadata and log objects.
pub trait MetadataStore: Send + Sync {
    /// Store `bytes` under `key`.
    ///
    /// Must fail with [`MetaError::AlreadyExists`](crate::MetaError) if the
    /// key is already present, without modifying the stored object.
    fn put(&self, key: &str, bytes: &[u8]) -> Result<()>;

    /// Load the object stored under `key`.
    ///
    /// Fails with [`MetaError::NotFound`](crate::MetaError) if absent.
    fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Remove the object stored under `key`.
    ///
    /// Deleting an absent key is not an error; deletion is how garbage
    /// collection reclaims logs and expired versions.
    fn delete(&self, key: &str) -> Result<()>;

    /// List all keys starting with `prefix`, in ascending key order.
    fn list(&self, prefix: &str) -> Result<Vec<String>>;
}
