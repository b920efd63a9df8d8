//! Typed scalar values and their storage/JSON forms

use std::fmt;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Serialize, Serializer};

use super::types::FieldType;

/// A typed field value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// Returns the scalar type of this value
    pub fn field_type(&self) -> FieldType {
        match self {
            Value::String(_) => FieldType::String,
            Value::Integer(_) => FieldType::Integer,
            Value::Float(_) => FieldType::Float,
            Value::Boolean(_) => FieldType::Boolean,
            Value::Timestamp(_) => FieldType::Timestamp,
        }
    }

    /// Canonical string written to the store
    pub fn to_storage(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Timestamp(t) => t.to_rfc3339_opts(SecondsFormat::Micros, true),
        }
    }

    /// Parses a stored string back into a value of the declared type
    pub fn from_storage(field_type: FieldType, raw: &str) -> Result<Self, String> {
        match field_type {
            FieldType::String => Ok(Value::String(raw.to_string())),
            FieldType::Integer => raw
                .parse()
                .map(Value::Integer)
                .map_err(|e| format!("invalid integer '{}': {}", raw, e)),
            FieldType::Float => match raw.parse::<f64>() {
                Ok(f) if f.is_finite() => Ok(Value::Float(f)),
                Ok(_) => Err(format!("non-finite float '{}'", raw)),
                Err(e) => Err(format!("invalid float '{}': {}", raw, e)),
            },
            FieldType::Boolean => raw
                .parse()
                .map(Value::Boolean)
                .map_err(|e| format!("invalid boolean '{}': {}", raw, e)),
            FieldType::Timestamp => parse_timestamp(raw).map(Value::Timestamp),
        }
    }

    /// Converts a JSON value into the declared type.
    ///
    /// Integers are accepted for float fields; nothing else is coerced.
    /// Timestamps are truncated to the microseconds the store keeps.
    pub fn from_json(field_type: FieldType, json: &serde_json::Value) -> Result<Self, String> {
        use serde_json::Value as Json;

        match (field_type, json) {
            (FieldType::String, Json::String(s)) => Ok(Value::String(s.clone())),
            (FieldType::Integer, Json::Number(n)) => n
                .as_i64()
                .map(Value::Integer)
                .ok_or_else(|| format!("non-integer number {}", n)),
            (FieldType::Float, Json::Number(n)) => n
                .as_f64()
                .filter(|f| f.is_finite())
                .map(Value::Float)
                .ok_or_else(|| format!("unrepresentable number {}", n)),
            (FieldType::Boolean, Json::Bool(b)) => Ok(Value::Boolean(*b)),
            (FieldType::Timestamp, Json::String(s)) => parse_timestamp(s)
                .map(|t| t.trunc_subsecs(6))
                .map(Value::Timestamp),
            (_, other) => Err(json_type_name(other).to_string()),
        }
    }

    /// Converts this value to the declared type for comparisons.
    ///
    /// Used when a caller-built filter carries an integer for a float field.
    pub fn coerce_to(&self, field_type: FieldType) -> Option<Value> {
        match (self, field_type) {
            (v, t) if v.field_type() == t => Some(v.clone()),
            (Value::Integer(i), FieldType::Float) => Some(Value::Float(*i as f64)),
            _ => None,
        }
    }

    /// JSON form returned to HTTP callers
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Value::from(*f),
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Timestamp(t) => serde_json::Value::String(t.to_rfc3339_opts(SecondsFormat::Micros, true)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_storage())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::String(s) => serializer.serialize_str(s),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Timestamp(t) => serializer.serialize_str(&t.to_rfc3339_opts(SecondsFormat::Micros, true)),
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

/// Accepts RFC 3339 and naive ISO-8601 (interpreted as UTC)
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Ok(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("invalid timestamp '{}': {}", raw, e))
}

pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
