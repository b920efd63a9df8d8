//! Schema validator for record field sets
//!
//! Validation semantics:
//! - All required fields are present (after defaults)
//! - No undeclared fields exist (`pk` is ignored, never written)
//! - Field types match schema types (integers accepted for floats)
//! - Null values are rejected
//! - Declared constraints hold
//!
//! The validator does not touch storage; it only produces typed field maps.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value as Json};

use super::errors::{SchemaError, SchemaResult, ValidationDetails};
use super::record::{Record, ID_FIELD};
use super::types::{DefaultValue, FieldDef, Schema};
use super::value::{json_type_name, Value};

/// Schema validator bound to one record type
pub struct SchemaValidator<'a> {
    schema: &'a Schema,
}

impl<'a> SchemaValidator<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Validates a field set for a new record.
    ///
    /// Omitted fields with a default receive it; `now` feeds `DefaultValue::Now`.
    pub fn validate_new(&self, body: &Json, now: DateTime<Utc>) -> SchemaResult<BTreeMap<String, Value>> {
        let obj = self.as_object(body)?;
        self.reject_undeclared(obj)?;

        let mut fields = BTreeMap::new();
        for def in &self.schema.fields {
            match obj.get(&def.name) {
                Some(json) => {
                    let value = self.parse_field(def, json)?;
                    fields.insert(def.name.clone(), value);
                }
                None => match &def.default {
                    Some(DefaultValue::Now) => {
                        fields.insert(def.name.clone(), Value::Timestamp(now));
                    }
                    Some(DefaultValue::Bool(b)) => {
                        fields.insert(def.name.clone(), Value::Boolean(*b));
                    }
                    None if def.required => {
                        return Err(SchemaError::validation_failed(ValidationDetails::missing_field(&def.name)));
                    }
                    None => {}
                },
            }
        }

        Ok(fields)
    }

    /// Validates an update against the stored record.
    ///
    /// Provided mutable fields replace stored values; omitted and immutable
    /// fields keep theirs.
    pub fn validate_update(&self, existing: &Record, body: &Json) -> SchemaResult<BTreeMap<String, Value>> {
        let obj = self.as_object(body)?;
        self.reject_undeclared(obj)?;

        let mut fields = existing.fields.clone();
        for def in &self.schema.fields {
            if def.immutable {
                continue;
            }
            if let Some(json) = obj.get(&def.name) {
                let value = self.parse_field(def, json)?;
                fields.insert(def.name.clone(), value);
            }
        }

        for def in &self.schema.fields {
            if def.required && !fields.contains_key(&def.name) {
                return Err(SchemaError::validation_failed(ValidationDetails::missing_field(&def.name)));
            }
        }

        Ok(fields)
    }

    /// Checks a typed value against a field's constraints
    pub fn check_constraints(def: &FieldDef, value: &Value) -> SchemaResult<()> {
        let c = &def.constraints;
        if c.is_empty() {
            return Ok(());
        }

        let numeric = match value {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        };
        if let Some(n) = numeric {
            if let Some(min) = c.min {
                if n < min {
                    return Err(SchemaError::validation_failed(ValidationDetails::new(
                        &def.name,
                        format!("value >= {}", min),
                        value.to_string(),
                    )));
                }
            }
            if let Some(max) = c.max {
                if n > max {
                    return Err(SchemaError::validation_failed(ValidationDetails::new(
                        &def.name,
                        format!("value <= {}", max),
                        value.to_string(),
                    )));
                }
            }
        }

        if let Value::String(s) = value {
            let len = s.chars().count();
            if let Some(min_len) = c.min_length {
                if len < min_len {
                    return Err(SchemaError::validation_failed(ValidationDetails::new(
                        &def.name,
                        format!("at least {} characters", min_len),
                        format!("{} characters", len),
                    )));
                }
            }
            if let Some(max_len) = c.max_length {
                if len > max_len {
                    return Err(SchemaError::validation_failed(ValidationDetails::new(
                        &def.name,
                        format!("at most {} characters", max_len),
                        format!("{} characters", len),
                    )));
                }
            }
            if let Some(pattern) = &c.pattern {
                if !pattern.is_match(s) {
                    return Err(SchemaError::validation_failed(ValidationDetails::new(
                        &def.name,
                        format!("match for pattern {}", pattern.as_str()),
                        format!("'{}'", s),
                    )));
                }
            }
        }

        Ok(())
    }

    fn as_object<'b>(&self, body: &'b Json) -> SchemaResult<&'b Map<String, Json>> {
        body.as_object().ok_or_else(|| {
            SchemaError::validation_failed(ValidationDetails::type_mismatch("$root", "object", json_type_name(body)))
        })
    }

    fn reject_undeclared(&self, obj: &Map<String, Json>) -> SchemaResult<()> {
        for key in obj.keys() {
            if key != ID_FIELD && self.schema.field(key).is_none() {
                return Err(SchemaError::validation_failed(ValidationDetails::extra_field(key)));
            }
        }
        Ok(())
    }

    fn parse_field(&self, def: &FieldDef, json: &Json) -> SchemaResult<Value> {
        if json.is_null() {
            return Err(SchemaError::validation_failed(ValidationDetails::null_value(&def.name)));
        }

        let value = Value::from_json(def.field_type, json).map_err(|actual| {
            SchemaError::validation_failed(ValidationDetails::type_mismatch(
                &def.name,
                def.field_type.type_name(),
                actual,
            ))
        })?;

        Self::check_constraints(def, &value)?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::builtin::{product_schema, user_schema};
    use crate::schema::types::RecordKind;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn test_valid_user() {
        let schema = user_schema();
        let validator = SchemaValidator::new(&schema);
        let fields = validator
            .validate_new(&json!({"name": "Ana", "email": "ana@example.com", "age": 30, "city": "Lima"}), now())
            .unwrap();

        assert_eq!(fields.get("age"), Some(&Value::Integer(30)));
        assert!(matches!(fields.get("created_at"), Some(Value::Timestamp(_))));
    }

    #[test]
    fn test_missing_required_field() {
        let schema = user_schema();
        let err = SchemaValidator::new(&schema)
            .validate_new(&json!({"name": "Ana", "age": 30, "city": "Lima"}), now())
            .unwrap_err();
        assert_eq!(err.details().unwrap().field, "email");
    }

    #[test]
    fn test_extra_field_rejected() {
        let schema = user_schema();
        let err = SchemaValidator::new(&schema)
            .validate_new(
                &json!({"name": "Ana", "email": "ana@example.com", "age": 30, "city": "Lima", "role": "admin"}),
                now(),
            )
            .unwrap_err();
        assert_eq!(err.details().unwrap().field, "role");
    }

    #[test]
    fn test_pk_in_body_ignored() {
        let schema = user_schema();
        let fields = SchemaValidator::new(&schema)
            .validate_new(
                &json!({"pk": "x", "name": "Ana", "email": "ana@example.com", "age": 30, "city": "Lima"}),
                now(),
            )
            .unwrap();
        assert!(!fields.contains_key("pk"));
    }

    #[test]
    fn test_age_bounds() {
        let schema = user_schema();
        let validator = SchemaValidator::new(&schema);
        for age in [0, 121] {
            let body = json!({"name": "Ana", "email": "ana@example.com", "age": age, "city": "Lima"});
            assert!(validator.validate_new(&body, now()).is_err(), "age {} should fail", age);
        }
        for age in [1, 120] {
            let body = json!({"name": "Ana", "email": "ana@example.com", "age": age, "city": "Lima"});
            assert!(validator.validate_new(&body, now()).is_ok(), "age {} should pass", age);
        }
    }

    #[test]
    fn test_name_length_bounds() {
        let schema = user_schema();
        let validator = SchemaValidator::new(&schema);

        let err = validator
            .validate_new(&json!({"name": "", "email": "ana@example.com", "age": 30, "city": "Lima"}), now())
            .unwrap_err();
        assert_eq!(err.details().unwrap().field, "name");

        let long = "a".repeat(101);
        let body = json!({"name": long, "email": "ana@example.com", "age": 30, "city": "Lima"});
        assert!(validator.validate_new(&body, now()).is_err());

        let body = json!({"name": "A", "email": "ana@example.com", "age": 30, "city": "Lima"});
        assert!(validator.validate_new(&body, now()).is_ok());
    }

    #[test]
    fn test_email_pattern() {
        let schema = user_schema();
        let err = SchemaValidator::new(&schema)
            .validate_new(&json!({"name": "Ana", "email": "not-an-email", "age": 30, "city": "Lima"}), now())
            .unwrap_err();
        assert_eq!(err.details().unwrap().field, "email");
    }

    #[test]
    fn test_null_rejected() {
        let schema = user_schema();
        let err = SchemaValidator::new(&schema)
            .validate_new(&json!({"name": null, "email": "ana@example.com", "age": 30, "city": "Lima"}), now())
            .unwrap_err();
        assert_eq!(err.details().unwrap().actual, "null");
    }

    #[test]
    fn test_negative_price_rejected() {
        let schema = product_schema();
        let err = SchemaValidator::new(&schema)
            .validate_new(&json!({"title": "Pen", "description": "", "price": -1, "category": "office"}), now())
            .unwrap_err();
        assert_eq!(err.details().unwrap().field, "price");
    }

    #[test]
    fn test_product_defaults() {
        let schema = product_schema();
        let fields = SchemaValidator::new(&schema)
            .validate_new(&json!({"title": "Pen", "description": "blue", "price": 1.5, "category": "office"}), now())
            .unwrap();
        assert_eq!(fields.get("in_stock"), Some(&Value::Boolean(true)));
    }

    #[test]
    fn test_update_merges_and_keeps_immutable() {
        let schema = user_schema();
        let validator = SchemaValidator::new(&schema);
        let created = now();
        let fields = validator
            .validate_new(&json!({"name": "Ana", "email": "ana@example.com", "age": 30, "city": "Lima"}), created)
            .unwrap();
        let existing = Record::new(RecordKind::User, "abc", fields);

        let updated = validator
            .validate_update(&existing, &json!({"city": "Cusco", "created_at": "2000-01-01T00:00:00Z"}))
            .unwrap();

        assert_eq!(updated.get("city"), Some(&Value::from("Cusco")));
        assert_eq!(updated.get("name"), Some(&Value::from("Ana")));
        assert_eq!(updated.get("created_at"), Some(&Value::Timestamp(created)));
    }

    #[test]
    fn test_update_revalidates() {
        let schema = user_schema();
        let validator = SchemaValidator::new(&schema);
        let fields = validator
            .validate_new(&json!({"name": "Ana", "email": "ana@example.com", "age": 30, "city": "Lima"}), now())
            .unwrap();
        let existing = Record::new(RecordKind::User, "abc", fields);

        assert!(validator.validate_update(&existing, &json!({"age": 500})).is_err());
        assert!(validator.validate_update(&existing, &json!(["age"])).is_err());
    }
}
