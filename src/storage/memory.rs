//! In-process storage gateway
//!
//! BTreeMap-backed store used for local runs and tests. Index buckets are
//! kept per prefix in a BTreeMap so ordered scans are plain range queries.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::index::IndexEntry;

use super::errors::{StorageError, StorageResult};
use super::gateway::{Fields, ScanBounds, StorageGateway};

type Buckets = BTreeMap<String, BTreeSet<String>>;

/// In-memory key-value store
#[derive(Debug)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<String, Fields>>,
    /// index prefix -> bucket -> ids
    indexes: RwLock<BTreeMap<String, Buckets>>,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            indexes: RwLock::new(BTreeMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Simulates an outage: while unavailable every call fails with
    /// `StorageError::Backend`.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of stored records
    pub fn record_count(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    fn check_available(&self) -> StorageResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StorageError::backend("memory store marked unavailable"))
        }
    }

    fn records(&self) -> StorageResult<RwLockReadGuard<'_, BTreeMap<String, Fields>>> {
        self.check_available()?;
        self.records.read().map_err(|_| StorageError::backend("record lock poisoned"))
    }

    fn records_mut(&self) -> StorageResult<RwLockWriteGuard<'_, BTreeMap<String, Fields>>> {
        self.check_available()?;
        self.records.write().map_err(|_| StorageError::backend("record lock poisoned"))
    }

    fn indexes(&self) -> StorageResult<RwLockReadGuard<'_, BTreeMap<String, Buckets>>> {
        self.check_available()?;
        self.indexes.read().map_err(|_| StorageError::backend("index lock poisoned"))
    }

    fn indexes_mut(&self) -> StorageResult<RwLockWriteGuard<'_, BTreeMap<String, Buckets>>> {
        self.check_available()?;
        self.indexes.write().map_err(|_| StorageError::backend("index lock poisoned"))
    }
}

#[async_trait]
impl StorageGateway for MemoryStore {
    async fn put(&self, key: &str, fields: &Fields) -> StorageResult<()> {
        self.records_mut()?.insert(key.to_string(), fields.clone());
        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<Fields> {
        self.records()?
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.records_mut()?
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn scan_keys(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let records = self.records()?;
        Ok(records
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .map(|(k, _)| k)
            .take_while(|k| k.starts_with(prefix))
            .filter(|k| !k[prefix.len()..].contains(':'))
            .cloned()
            .collect())
    }

    async fn index_add(&self, entry: &IndexEntry, id: &str) -> StorageResult<()> {
        self.indexes_mut()?
            .entry(entry.prefix.clone())
            .or_default()
            .entry(entry.bucket.clone())
            .or_default()
            .insert(id.to_string());
        Ok(())
    }

    async fn index_remove(&self, entry: &IndexEntry, id: &str) -> StorageResult<()> {
        let mut indexes = self.indexes_mut()?;
        if let Some(buckets) = indexes.get_mut(&entry.prefix) {
            if let Some(ids) = buckets.get_mut(&entry.bucket) {
                ids.remove(id);
                if ids.is_empty() {
                    buckets.remove(&entry.bucket);
                }
            }
            if buckets.is_empty() {
                indexes.remove(&entry.prefix);
            }
        }
        Ok(())
    }

    async fn index_members(&self, entry: &IndexEntry) -> StorageResult<Vec<String>> {
        let indexes = self.indexes()?;
        Ok(indexes
            .get(&entry.prefix)
            .and_then(|buckets| buckets.get(&entry.bucket))
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn index_scan(&self, prefix: &str, bounds: &ScanBounds) -> StorageResult<Vec<String>> {
        if bounds.is_inverted() {
            return Ok(Vec::new());
        }

        let indexes = self.indexes()?;
        let Some(buckets) = indexes.get(prefix) else {
            return Ok(Vec::new());
        };

        let lower = bounds.lower.as_deref().map_or(Bound::Unbounded, Bound::Included);
        let upper = bounds.upper.as_deref().map_or(Bound::Unbounded, Bound::Included);

        let ids: BTreeSet<String> = buckets
            .range::<str, _>((lower, upper))
            .flat_map(|(_, ids)| ids.iter().cloned())
            .collect();
        Ok(ids.into_iter().collect())
    }

    async fn ping(&self) -> StorageResult<()> {
        self.check_available()
    }
}
