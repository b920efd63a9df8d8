//! Storage gateway contract
//!
//! Thin async contract over the backing key-value store. Records are flat
//! string hashes; index entries are sets of ids addressed by bucket.
//! Implementations must be safe for concurrent use (Send + Sync).

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::index::IndexEntry;

use super::errors::StorageResult;

/// Flat field map stored under a primary key
pub type Fields = BTreeMap<String, String>;

/// Inclusive bucket bounds for an ordered index scan.
///
/// `None` leaves that side open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanBounds {
    pub lower: Option<String>,
    pub upper: Option<String>,
}

impl ScanBounds {
    pub fn new(lower: Option<String>, upper: Option<String>) -> Self {
        Self { lower, upper }
    }

    /// Returns true if the bounds cannot contain any bucket
    pub fn is_inverted(&self) -> bool {
        matches!((&self.lower, &self.upper), (Some(l), Some(u)) if l > u)
    }

    /// Returns true if the bucket lies within the bounds
    pub fn contains(&self, bucket: &str) -> bool {
        self.lower.as_deref().map_or(true, |l| bucket >= l)
            && self.upper.as_deref().map_or(true, |u| bucket <= u)
    }
}

/// Key-value backend used by the record services
#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// Writes the full field map, replacing any previous value
    async fn put(&self, key: &str, fields: &Fields) -> StorageResult<()>;

    /// Reads a field map; `StorageError::NotFound` if absent
    async fn get(&self, key: &str) -> StorageResult<Fields>;

    /// Deletes a key; `StorageError::NotFound` if absent
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Lists primary keys starting with `prefix` (index keys excluded)
    async fn scan_keys(&self, prefix: &str) -> StorageResult<Vec<String>>;

    /// Adds `id` to the entry's bucket
    async fn index_add(&self, entry: &IndexEntry, id: &str) -> StorageResult<()>;

    /// Removes `id` from the entry's bucket
    async fn index_remove(&self, entry: &IndexEntry, id: &str) -> StorageResult<()>;

    /// Ids listed in exactly this bucket
    async fn index_members(&self, entry: &IndexEntry) -> StorageResult<Vec<String>>;

    /// Ids listed in any bucket under `prefix` within `bounds`, sorted and deduplicated
    async fn index_scan(&self, prefix: &str, bounds: &ScanBounds) -> StorageResult<Vec<String>>;

    /// Connectivity check
    async fn ping(&self) -> StorageResult<()>;
}
