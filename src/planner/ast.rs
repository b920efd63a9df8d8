//! Filter expression tree
//!
//! Atoms are field comparisons (`==`, `>=`, `<=`, inclusive range) joined by
//! AND. There is no OR and no NOT.

use crate::index::IndexKey;
use crate::schema::{Record, Value};

/// Declarative filter over one record type
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// field == value
    Equals { field: String, value: Value },
    /// min <= field <= max, either side optional
    Range {
        field: String,
        min: Option<Value>,
        max: Option<Value>,
    },
    /// Conjunction; empty means "every record"
    And(Vec<Filter>),
}

impl Filter {
    /// Filter matching every record of the type
    pub fn all() -> Self {
        Filter::And(Vec::new())
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Range {
            field: field.into(),
            min: Some(value.into()),
            max: None,
        }
    }

    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Range {
            field: field.into(),
            min: None,
            max: Some(value.into()),
        }
    }

    /// Inclusive on both ends
    pub fn between(field: impl Into<String>, min: impl Into<Value>, max: impl Into<Value>) -> Self {
        Filter::Range {
            field: field.into(),
            min: Some(min.into()),
            max: Some(max.into()),
        }
    }

    /// Conjunction of `self` and `other`, flattened
    pub fn and(self, other: Filter) -> Self {
        let mut parts = match self {
            Filter::And(parts) => parts,
            atom => vec![atom],
        };
        match other {
            Filter::And(more) => parts.extend(more),
            atom => parts.push(atom),
        }
        Filter::And(parts)
    }

    /// Leaf comparisons in tree order
    pub fn atoms(&self) -> Vec<&Filter> {
        match self {
            Filter::And(parts) => parts.iter().flat_map(|p| p.atoms()).collect(),
            atom => vec![atom],
        }
    }

    /// Returns true if the filter has no atoms
    pub fn is_empty(&self) -> bool {
        self.atoms().is_empty()
    }

    /// Field referenced by an atom
    pub fn field(&self) -> Option<&str> {
        match self {
            Filter::Equals { field, .. } | Filter::Range { field, .. } => Some(field),
            Filter::And(_) => None,
        }
    }

    /// Operation name for plan output
    pub fn op_name(&self) -> &'static str {
        match self {
            Filter::Equals { .. } => "eq",
            Filter::Range { min: Some(_), max: Some(_), .. } => "range",
            Filter::Range { min: Some(_), .. } => "gte",
            Filter::Range { max: Some(_), .. } => "lte",
            Filter::Range { .. } => "any",
            Filter::And(_) => "and",
        }
    }

    /// Evaluates the filter against a loaded record.
    ///
    /// Used to drop index hits whose record no longer carries the value.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Filter::And(parts) => parts.iter().all(|p| p.matches(record)),
            Filter::Equals { field, value } => match record.get(field) {
                Some(actual) => compare_key(actual, value).is_some_and(|(a, v)| a == v),
                None => false,
            },
            Filter::Range { field, min, max } => {
                let Some(actual) = record.get(field) else {
                    return false;
                };
                let above = match min {
                    Some(bound) => compare_key(actual, bound).is_some_and(|(a, b)| a >= b),
                    None => true,
                };
                let below = match max {
                    Some(bound) => compare_key(actual, bound).is_some_and(|(a, b)| a <= b),
                    None => true,
                };
                above && below
            }
        }
    }
}

/// Index keys of a stored value and a filter operand coerced to its type
fn compare_key(actual: &Value, operand: &Value) -> Option<(IndexKey, IndexKey)> {
    let operand = operand.coerce_to(actual.field_type())?;
    Some((IndexKey::from_value(actual), IndexKey::from_value(&operand)))
}
