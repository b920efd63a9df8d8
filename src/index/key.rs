//! Order-preserving index keys
//!
//! Each indexed value is reduced to an `IndexKey` and then rendered as a
//! bucket string. Byte-wise order of buckets equals value order within one
//! field, so range lookups become ordered scans over bucket names.

use crate::schema::Value;

/// Index key representing a field value.
///
/// Ordering is deterministic: Bool < Int < Float < String.
/// Timestamps are keyed by epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexKey {
    /// Boolean value (false < true)
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Float value (stored as bits for total ordering)
    Float(u64),
    /// String value
    String(String),
}

impl IndexKey {
    pub fn from_bool(v: bool) -> Self {
        IndexKey::Bool(v)
    }

    pub fn from_int(v: i64) -> Self {
        IndexKey::Int(v)
    }

    /// Create a key from a float
    ///
    /// Uses bit representation for total ordering; `-0.0` keys as `0.0`.
    pub fn from_float(v: f64) -> Self {
        let v = if v == 0.0 { 0.0 } else { v };
        let bits = v.to_bits();
        let ordered = if (bits >> 63) == 1 {
            !bits // Negative: flip all bits
        } else {
            bits ^ (1 << 63) // Positive: flip sign bit
        };
        IndexKey::Float(ordered)
    }

    pub fn from_string(v: impl Into<String>) -> Self {
        IndexKey::String(v.into())
    }

    /// Create a key from a typed field value
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Boolean(b) => IndexKey::from_bool(*b),
            Value::Integer(i) => IndexKey::from_int(*i),
            Value::Float(f) => IndexKey::from_float(*f),
            Value::String(s) => IndexKey::from_string(s.as_str()),
            Value::Timestamp(t) => IndexKey::from_int(t.timestamp_millis()),
        }
    }

    /// Bucket name used as the last segment of the index key
    pub fn bucket(&self) -> String {
        match self {
            IndexKey::Bool(b) => if *b { "1" } else { "0" }.to_string(),
            IndexKey::Int(i) => format!("{:016x}", (*i as u64) ^ (1 << 63)),
            IndexKey::Float(bits) => format!("{:016x}", bits),
            IndexKey::String(s) => s.clone(),
        }
    }
}
