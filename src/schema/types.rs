//! Schema type definitions
//!
//! Supported scalar types:
//! - string: UTF-8 string
//! - integer: 64-bit signed integer
//! - float: 64-bit floating point
//! - boolean: Boolean
//! - timestamp: UTC instant, millisecond ordering

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::Serialize;

use super::errors::SchemaError;

/// Record types served by this process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    User,
    Product,
}

impl RecordKind {
    /// All known record kinds, in registration order
    pub const ALL: [RecordKind; 2] = [RecordKind::User, RecordKind::Product];

    /// Key prefix used for primary and index keys
    pub fn prefix(&self) -> &'static str {
        match self {
            RecordKind::User => "user",
            RecordKind::Product => "product",
        }
    }

    /// Human-readable type name for messages
    pub fn label(&self) -> &'static str {
        match self {
            RecordKind::User => "User",
            RecordKind::Product => "Product",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

impl FromStr for RecordKind {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "user" => Ok(RecordKind::User),
            "product" => Ok(RecordKind::Product),
            _ => Err(SchemaError::unknown_type(s)),
        }
    }
}

/// Scalar field types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Integer,
    Float,
    Boolean,
    Timestamp,
}

impl FieldType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Boolean => "boolean",
            FieldType::Timestamp => "timestamp",
        }
    }
}

/// Value assigned to a field the caller left out
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    /// Current time at validation
    Now,
    /// Fixed boolean
    Bool(bool),
}

/// Optional value constraints
#[derive(Debug, Clone, Default)]
pub struct Constraints {
    /// Inclusive numeric lower bound
    pub min: Option<f64>,
    /// Inclusive numeric upper bound
    pub max: Option<f64>,
    /// Minimum string length in characters
    pub min_length: Option<usize>,
    /// Maximum string length in characters
    pub max_length: Option<usize>,
    /// Full-match pattern for strings
    pub pattern: Option<Regex>,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        self.min.is_none()
            && self.max.is_none()
            && self.min_length.is_none()
            && self.max_length.is_none()
            && self.pattern.is_none()
    }
}

/// Field definition
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Field name (also used in index keys)
    pub name: String,
    /// Field data type
    pub field_type: FieldType,
    /// Whether a secondary index is maintained
    pub indexed: bool,
    /// Whether field must be present after defaults apply
    pub required: bool,
    /// Whether updates keep the stored value
    pub immutable: bool,
    /// Default for omitted values
    pub default: Option<DefaultValue>,
    /// Value constraints
    pub constraints: Constraints,
}

impl FieldDef {
    /// Create a required, unindexed field of the given type
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            indexed: false,
            required: true,
            immutable: false,
            default: None,
            constraints: Constraints::default(),
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::String)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Integer)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Float)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    pub fn timestamp(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Timestamp)
    }

    /// Maintain a secondary index for this field
    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    /// Allow the field to be absent
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Keep the stored value on update
    pub fn immutable(mut self) -> Self {
        self.immutable = true;
        self
    }

    pub fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.constraints.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.constraints.max = Some(max);
        self
    }

    pub fn min_length(mut self, len: usize) -> Self {
        self.constraints.min_length = Some(len);
        self
    }

    pub fn max_length(mut self, len: usize) -> Self {
        self.constraints.max_length = Some(len);
        self
    }

    pub fn pattern(mut self, pattern: Regex) -> Self {
        self.constraints.pattern = Some(pattern);
        self
    }
}

/// Complete schema for one record type
#[derive(Debug, Clone)]
pub struct Schema {
    /// Record type this schema describes
    pub kind: RecordKind,
    /// Ordered field definitions
    pub fields: Vec<FieldDef>,
}

impl Schema {
    pub fn new(kind: RecordKind, fields: Vec<FieldDef>) -> Self {
        Self { kind, fields }
    }

    /// Looks up a field definition by name
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Iterates indexed fields in declaration order
    pub fn indexed_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.indexed)
    }

    /// Validates the schema structure itself (not a record)
    pub fn validate_structure(&self) -> Result<(), String> {
        if self.fields.is_empty() {
            return Err("Schema must declare at least one field".into());
        }

        let mut seen = std::collections::HashSet::new();
        for field in &self.fields {
            if field.name.is_empty() || field.name.contains(':') {
                return Err(format!("Invalid field name '{}'", field.name));
            }
            if field.name == super::record::ID_FIELD {
                return Err(format!("'{}' is reserved for the record identifier", field.name));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(format!("Duplicate field '{}'", field.name));
            }
            if field.default.is_some() && !field.required {
                return Err(format!("Field '{}' has a default and must be required", field.name));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_str() {
        assert_eq!("user".parse::<RecordKind>().unwrap(), RecordKind::User);
        assert_eq!("Product".parse::<RecordKind>().unwrap(), RecordKind::Product);
        assert!("products".parse::<RecordKind>().is_err());

        let err = "order".parse::<RecordKind>().unwrap_err();
        assert_eq!(err.code().code(), "OM_UNKNOWN_TYPE");
    }

    #[test]
    fn test_schema_rejects_duplicate_fields() {
        let schema = Schema::new(
            RecordKind::User,
            vec![FieldDef::string("name"), FieldDef::string("name")],
        );
        assert!(schema.validate_structure().unwrap_err().contains("Duplicate"));
    }

    #[test]
    fn test_schema_rejects_colon_in_name() {
        let schema = Schema::new(RecordKind::User, vec![FieldDef::string("a:b")]);
        assert!(schema.validate_structure().is_err());
    }

    #[test]
    fn test_schema_rejects_reserved_id() {
        let schema = Schema::new(RecordKind::User, vec![FieldDef::string("pk")]);
        assert!(schema.validate_structure().unwrap_err().contains("reserved"));
    }

    #[test]
    fn test_indexed_fields_in_order() {
        let schema = Schema::new(
            RecordKind::Product,
            vec![
                FieldDef::string("title").indexed(),
                FieldDef::string("description"),
                FieldDef::float("price").indexed(),
            ],
        );
        let names: Vec<_> = schema.indexed_fields().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["title", "price"]);
    }
}
