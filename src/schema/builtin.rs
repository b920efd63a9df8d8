//! Built-in record types: User and Product

use std::sync::OnceLock;

use regex::Regex;

use super::types::{DefaultValue, FieldDef, RecordKind, Schema};

const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";

fn email_pattern() -> Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern is a valid literal"))
        .clone()
}

/// User{name, email, age, city, created_at}
pub fn user_schema() -> Schema {
    Schema::new(
        RecordKind::User,
        vec![
            FieldDef::string("name").indexed().min_length(1).max_length(100),
            FieldDef::string("email").indexed().pattern(email_pattern()),
            FieldDef::integer("age").indexed().min(1.0).max(120.0),
            FieldDef::string("city").indexed(),
            FieldDef::timestamp("created_at")
                .with_default(DefaultValue::Now)
                .immutable(),
        ],
    )
}

/// Product{title, description, price, category, in_stock, created_at}
pub fn product_schema() -> Schema {
    Schema::new(
        RecordKind::Product,
        vec![
            FieldDef::string("title").indexed(),
            FieldDef::string("description"),
            FieldDef::float("price").indexed().min(0.0),
            FieldDef::string("category").indexed(),
            FieldDef::boolean("in_stock")
                .indexed()
                .with_default(DefaultValue::Bool(true)),
            FieldDef::timestamp("created_at")
                .with_default(DefaultValue::Now)
                .immutable(),
        ],
    )
}
