//! Per-type record service
//!
//! Lifecycle: absent -> active -> deleted (terminal).
//!
//! Write ordering:
//! - create: primary record, then index entries
//! - update: index removals, index additions, then primary record
//! - delete: index entries, then primary record
//!
//! A crash between steps leaves at worst a record missing an index entry, or
//! an index entry pointing at nothing. Search tolerates the latter by loading
//! every hit and skipping ids that no longer resolve.
//!
//! Concurrent writes to one id race in the store; the last write wins.

use std::sync::Arc;

use chrono::{SubsecRound, Utc};
use futures_util::future::try_join_all;
use serde_json::Value as Json;
use tracing::{debug, info, warn};

use crate::index::{primary_key, KeyMapper};
use crate::planner::{Filter, PlanExecutor, QueryPlanner};
use crate::schema::{Record, RecordKind, Schema, SchemaRegistry, SchemaValidator};
use crate::storage::{StorageError, StorageGateway};

use super::errors::{ServiceError, ServiceResult};

/// Orchestrates create/read/update/delete/search for one record type
#[derive(Clone)]
pub struct RecordService {
    kind: RecordKind,
    registry: Arc<SchemaRegistry>,
    store: Arc<dyn StorageGateway>,
}

impl RecordService {
    /// Fails with `UnknownType` if the registry has no schema for `kind`
    pub fn new(
        kind: RecordKind,
        registry: Arc<SchemaRegistry>,
        store: Arc<dyn StorageGateway>,
    ) -> ServiceResult<Self> {
        registry.schema_of(kind)?;
        Ok(Self { kind, registry, store })
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    fn schema(&self) -> ServiceResult<&Schema> {
        Ok(self.registry.schema_of(self.kind)?)
    }

    /// absent -> active
    pub async fn create(&self, body: &Json) -> ServiceResult<Record> {
        let schema = self.schema()?;
        // Stored timestamps carry microseconds
        let now = Utc::now().trunc_subsecs(6);
        let fields = SchemaValidator::new(schema).validate_new(body, now)?;
        let record = Record::new(self.kind, Record::generate_id(), fields);

        let keys = KeyMapper::new(schema).compute_keys(&record);
        self.store
            .put(&keys.primary_key, &record.to_storage())
            .await
            .map_err(|e| self.backend_failure("create", e))?;

        for entry in &keys.index_entries {
            self.store
                .index_add(entry, &record.id)
                .await
                .map_err(|e| self.backend_failure("create", e))?;
        }

        info!(kind = %self.kind, id = %record.id, indexes = keys.index_entries.len(), "record created");
        Ok(record)
    }

    /// Fails with `NotFound` if the id was never created or was deleted
    pub async fn read(&self, id: &str) -> ServiceResult<Record> {
        let schema = self.schema()?;
        match self.load(schema, id).await? {
            Some(record) => Ok(record),
            None => Err(ServiceError::not_found(self.kind, id)),
        }
    }

    /// active -> active. Provided fields are merged over the stored instance.
    pub async fn update(&self, id: &str, body: &Json) -> ServiceResult<Record> {
        let schema = self.schema()?;
        let existing = self.read(id).await?;

        let fields = SchemaValidator::new(schema).validate_update(&existing, body)?;
        let updated = Record::new(self.kind, id, fields);

        let mapper = KeyMapper::new(schema);
        let diff = mapper.diff_index_entries(&existing, &updated);
        debug!(
            kind = %self.kind,
            id,
            removed = diff.to_remove.len(),
            added = diff.to_add.len(),
            "index diff computed"
        );

        for entry in &diff.to_remove {
            self.store
                .index_remove(entry, id)
                .await
                .map_err(|e| self.backend_failure("update", e))?;
        }
        for entry in &diff.to_add {
            self.store
                .index_add(entry, id)
                .await
                .map_err(|e| self.backend_failure("update", e))?;
        }

        self.store
            .put(&primary_key(self.kind, id), &updated.to_storage())
            .await
            .map_err(|e| self.backend_failure("update", e))?;

        info!(kind = %self.kind, id, "record updated");
        Ok(updated)
    }

    /// active -> deleted. A second delete of the same id is `NotFound`.
    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        let schema = self.schema()?;
        let existing = self.read(id).await?;
        let keys = KeyMapper::new(schema).compute_keys(&existing);

        for entry in &keys.index_entries {
            self.store
                .index_remove(entry, id)
                .await
                .map_err(|e| self.backend_failure("delete", e))?;
        }

        match self.store.delete(&keys.primary_key).await {
            Ok(()) => {}
            // Lost a race with another delete
            Err(StorageError::NotFound(_)) => return Err(ServiceError::not_found(self.kind, id)),
            Err(e) => return Err(self.backend_failure("delete", e)),
        }

        info!(kind = %self.kind, id, "record deleted");
        Ok(())
    }

    /// Records matching `filter`, in identifier order.
    ///
    /// Stale index hits are skipped silently.
    pub async fn search(&self, filter: &Filter) -> ServiceResult<Vec<Record>> {
        let schema = self.schema()?;
        let plan = QueryPlanner::new(schema).plan(filter)?;
        debug!(kind = %self.kind, plan = %plan, "executing search");

        let ids = PlanExecutor::new(self.store.as_ref())
            .execute(&plan)
            .await
            .map_err(|e| self.backend_failure("search", e))?;

        let loaded = try_join_all(ids.iter().map(|id| self.load(schema, id))).await?;

        let records: Vec<Record> = loaded
            .into_iter()
            .flatten()
            .filter(|record| {
                let keep = filter.matches(record);
                if !keep {
                    debug!(kind = %self.kind, id = %record.id, "index hit no longer matches, skipped");
                }
                keep
            })
            .collect();

        debug!(kind = %self.kind, candidates = ids.len(), results = records.len(), "search done");
        Ok(records)
    }

    /// Every active record of the type
    pub async fn list(&self) -> ServiceResult<Vec<Record>> {
        self.search(&Filter::all()).await
    }

    /// Loads one record, `None` if the primary key is absent
    async fn load(&self, schema: &Schema, id: &str) -> ServiceResult<Option<Record>> {
        // Ids never contain ':'; such a key would address an index entry
        if id.is_empty() || id.contains(':') {
            return Ok(None);
        }

        let raw = match self.store.get(&primary_key(self.kind, id)).await {
            Ok(raw) => raw,
            Err(StorageError::NotFound(_)) => {
                debug!(kind = %self.kind, id, "primary key absent");
                return Ok(None);
            }
            Err(e) => return Err(self.backend_failure("read", e)),
        };

        Record::from_storage(schema, id, &raw)
            .map(Some)
            .map_err(|e| ServiceError::Internal(format!("stored {} '{}' is corrupt: {}", self.kind, id, e)))
    }

    fn backend_failure(&self, op: &str, err: StorageError) -> ServiceError {
        warn!(kind = %self.kind, op, error = %err, "storage operation failed");
        err.into()
    }
}
