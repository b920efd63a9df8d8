//! Shared handler state
//!
//! The schema registry is read-only after startup; the store handle is the
//! only shared resource and is safe for concurrent use.

use std::sync::Arc;

use tracing::info;

use crate::config::{StoreBackend, StoreConfig};
use crate::schema::{RecordKind, SchemaRegistry};
use crate::service::{RecordService, ServiceResult};
use crate::storage::{MemoryStore, RedisStore, StorageGateway};

/// State shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<RecordService>,
    pub products: Arc<RecordService>,
    pub store: Arc<dyn StorageGateway>,
}

impl AppState {
    pub fn new(registry: Arc<SchemaRegistry>, store: Arc<dyn StorageGateway>) -> ServiceResult<Self> {
        Ok(Self {
            users: Arc::new(RecordService::new(RecordKind::User, registry.clone(), store.clone())?),
            products: Arc::new(RecordService::new(RecordKind::Product, registry, store.clone())?),
            store,
        })
    }

    /// Built-in schemas over the given store
    pub fn with_store(store: Arc<dyn StorageGateway>) -> ServiceResult<Self> {
        let registry = Arc::new(SchemaRegistry::builtin()?);
        Self::new(registry, store)
    }

    /// Built-in schemas over a fresh in-memory store
    pub fn in_memory() -> ServiceResult<Self> {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    /// Opens the configured backend
    pub async fn connect(config: &StoreConfig) -> ServiceResult<Self> {
        let store: Arc<dyn StorageGateway> = match config.backend {
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
            StoreBackend::Redis => {
                info!(url = %config.redacted_url(), "connecting to redis");
                Arc::new(RedisStore::connect(&config.url()).await?)
            }
        };
        info!(backend = %config.backend, "store ready");
        Self::with_store(store)
    }
}
