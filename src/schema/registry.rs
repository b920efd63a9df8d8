//! Schema registry
//!
//! Populated once at startup and shared read-only afterwards.
//! Registering a type twice is rejected.

use std::collections::HashMap;

use super::builtin::{product_schema, user_schema};
use super::errors::{SchemaError, SchemaResult};
use super::types::{RecordKind, Schema};

/// In-memory lookup table from record type to schema
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<RecordKind, Schema>,
}

impl SchemaRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the User and Product schemas
    pub fn builtin() -> SchemaResult<Self> {
        let mut registry = Self::new();
        registry.register(user_schema())?;
        registry.register(product_schema())?;
        Ok(registry)
    }

    /// Registers a schema for its record type.
    pub fn register(&mut self, schema: Schema) -> SchemaResult<()> {
        schema
            .validate_structure()
            .map_err(|e| SchemaError::invalid_schema(schema.kind, e))?;

        if self.schemas.contains_key(&schema.kind) {
            return Err(SchemaError::schema_immutable(schema.kind));
        }

        self.schemas.insert(schema.kind, schema);
        Ok(())
    }

    /// Returns the schema for a record type.
    pub fn schema_of(&self, kind: RecordKind) -> SchemaResult<&Schema> {
        self.schemas.get(&kind).ok_or_else(|| SchemaError::unknown_type(kind))
    }

    /// Resolves a type by name, then returns its schema.
    pub fn schema_named(&self, name: &str) -> SchemaResult<&Schema> {
        self.schema_of(name.parse()?)
    }

    /// Returns the number of registered schemas.
    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }
}
