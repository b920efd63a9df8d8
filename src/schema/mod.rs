//! Record schema registry
//!
//! Schemas are explicit descriptor tables built at startup: per record type,
//! the ordered fields, their scalar types, which are indexed, and their
//! constraints. Every write is validated against them before it reaches
//! storage; violations reject the write.

mod builtin;
mod errors;
mod record;
mod registry;
mod types;
mod validator;
mod value;

pub use builtin::{product_schema, user_schema};
pub use errors::{SchemaError, SchemaErrorCode, SchemaResult, Severity, ValidationDetails};
pub use record::{Record, ID_FIELD};
pub use registry::SchemaRegistry;
pub use types::{Constraints, DefaultValue, FieldDef, FieldType, RecordKind, Schema};
pub use validator::SchemaValidator;
pub use value::Value;
