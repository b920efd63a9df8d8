//! Storage gateway
//!
//! The only component that talks to the backing key-value store. Record
//! services own the lifecycle of keys; the gateway only executes single
//! operations and reports failures verbatim.
//!
//! # Backends
//!
//! - `MemoryStore`: in-process BTreeMaps
//! - `RedisStore`: hashes, sets and lexicographic sorted sets

mod errors;
mod gateway;
mod memory;
mod redis_store;

pub use self::errors::{StorageError, StorageResult};
pub use self::gateway::{Fields, ScanBounds, StorageGateway};
pub use self::memory::MemoryStore;
pub use self::redis_store::RedisStore;
