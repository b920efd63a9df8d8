//! Key/index mapper
//!
//! Derives storage keys from records. Indexes are derived state: they mirror
//! current record field values and never act as the source of truth.
//!
//! # Invariants
//!
//! - Key computation is a pure function of type + current field values
//! - Bucket order equals value order within a field
//! - Updates touch only the entries of fields whose value changed

mod key;
mod mapper;

pub use key::IndexKey;
pub use mapper::{index_prefix, primary_key, record_prefix, IndexDiff, IndexEntry, KeyMapper, RecordKeys};
