//! Record instances

use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, Serializer};
use uuid::Uuid;

use super::errors::{SchemaError, SchemaResult, ValidationDetails};
use super::types::{RecordKind, Schema};
use super::value::Value;

/// JSON/body key carrying the record identifier
pub const ID_FIELD: &str = "pk";

/// A persisted record: type tag, immutable identifier and typed fields
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub kind: RecordKind,
    pub id: String,
    pub fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(kind: RecordKind, id: impl Into<String>, fields: BTreeMap<String, Value>) -> Self {
        Self {
            kind,
            id: id.into(),
            fields,
        }
    }

    /// Generates a fresh identifier (32 hex chars, never contains ':')
    pub fn generate_id() -> String {
        Uuid::new_v4().simple().to_string()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Flat string hash written to the store
    pub fn to_storage(&self) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .map(|(name, value)| (name.clone(), value.to_storage()))
            .collect()
    }

    /// Decodes a stored hash using the schema's field types.
    ///
    /// Unknown stored fields are dropped; type errors are reported.
    pub fn from_storage(schema: &Schema, id: &str, raw: &BTreeMap<String, String>) -> SchemaResult<Self> {
        let mut fields = BTreeMap::new();
        for def in &schema.fields {
            match raw.get(&def.name) {
                Some(s) => {
                    let value = Value::from_storage(def.field_type, s).map_err(|reason| {
                        SchemaError::validation_failed(ValidationDetails::type_mismatch(
                            &def.name,
                            def.field_type.type_name(),
                            reason,
                        ))
                    })?;
                    fields.insert(def.name.clone(), value);
                }
                None if def.required => {
                    return Err(SchemaError::validation_failed(ValidationDetails::missing_field(&def.name)));
                }
                None => {}
            }
        }
        Ok(Self::new(schema.kind, id, fields))
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry(ID_FIELD, &self.id)?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
