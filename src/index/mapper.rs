//! Key/index mapper
//!
//! Pure planning step: derives the primary key and secondary index entries of
//! a record, and the entries an update must remove and add. It never touches
//! storage.
//!
//! Key layout:
//! - primary key: `<prefix>:<id>`
//! - index entry: `<prefix>:<field>:<bucket>` holding the set of ids

use std::collections::BTreeSet;

use crate::schema::{RecordKind, Record, Schema, Value};

use super::key::IndexKey;

/// Primary key for a record identifier
pub fn primary_key(kind: RecordKind, id: &str) -> String {
    format!("{}:{}", kind.prefix(), id)
}

/// Prefix shared by every primary key of a type
pub fn record_prefix(kind: RecordKind) -> String {
    format!("{}:", kind.prefix())
}

/// Prefix shared by every bucket of one indexed field
pub fn index_prefix(kind: RecordKind, field: &str) -> String {
    format!("{}:{}:", kind.prefix(), field)
}

/// One secondary index entry: the bucket under which the record id is listed
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndexEntry {
    /// Indexed field name
    pub field: String,
    /// `<prefix>:<field>:`
    pub prefix: String,
    /// Order-preserving value bucket
    pub bucket: String,
}

impl IndexEntry {
    /// Full index key
    pub fn key(&self) -> String {
        format!("{}{}", self.prefix, self.bucket)
    }
}

/// Keys owned by one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordKeys {
    pub primary_key: String,
    pub index_entries: BTreeSet<IndexEntry>,
}

/// Index changes required by an update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexDiff {
    pub to_add: Vec<IndexEntry>,
    pub to_remove: Vec<IndexEntry>,
}

impl IndexDiff {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Computes keys for records of one type
pub struct KeyMapper<'a> {
    schema: &'a Schema,
}

impl<'a> KeyMapper<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Index entry for a field value, or `None` if the field is not indexed.
    pub fn entry_for(&self, field: &str, value: &Value) -> Option<IndexEntry> {
        let def = self.schema.field(field).filter(|d| d.indexed)?;
        let value = value.coerce_to(def.field_type)?;
        Some(IndexEntry {
            field: def.name.clone(),
            prefix: index_prefix(self.schema.kind, &def.name),
            bucket: IndexKey::from_value(&value).bucket(),
        })
    }

    /// Primary key and every index entry of the record's current values
    pub fn compute_keys(&self, record: &Record) -> RecordKeys {
        let index_entries = self
            .schema
            .indexed_fields()
            .filter_map(|def| {
                record
                    .get(&def.name)
                    .and_then(|value| self.entry_for(&def.name, value))
            })
            .collect();

        RecordKeys {
            primary_key: primary_key(self.schema.kind, &record.id),
            index_entries,
        }
    }

    /// Field-by-field comparison of old and new index entries.
    ///
    /// Unchanged fields produce nothing.
    pub fn diff_index_entries(&self, old: &Record, new: &Record) -> IndexDiff {
        let mut diff = IndexDiff::default();

        for def in self.schema.indexed_fields() {
            let before = old.get(&def.name).and_then(|v| self.entry_for(&def.name, v));
            let after = new.get(&def.name).and_then(|v| self.entry_for(&def.name, v));

            if before == after {
                continue;
            }
            if let Some(entry) = before {
                diff.to_remove.push(entry);
            }
            if let Some(entry) = after {
                diff.to_add.push(entry);
            }
        }

        diff
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::user_schema;
    use std::collections::BTreeMap;

    fn user(id: &str, age: i64, city: &str) -> Record {
        let mut fields = BTreeMap::new();
        fields.insert("name".to_string(), Value::from("Ana"));
        fields.insert("email".to_string(), Value::from("ana@example.com"));
        fields.insert("age".to_string(), Value::Integer(age));
        fields.insert("city".to_string(), Value::from(city));
        Record::new(RecordKind::User, id, fields)
    }

    #[test]
    fn test_primary_key_format() {
        assert_eq!(primary_key(RecordKind::User, "abc"), "user:abc");
        assert_eq!(primary_key(RecordKind::Product, "abc"), "product:abc");
    }

    #[test]
    fn test_compute_keys_covers_indexed_fields_only() {
        let schema = user_schema();
        let keys = KeyMapper::new(&schema).compute_keys(&user("abc", 30, "Lima"));

        assert_eq!(keys.primary_key, "user:abc");
        let fields: Vec<_> = keys.index_entries.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["age", "city", "email", "name"]);
        assert!(keys.index_entries.iter().any(|e| e.key() == "user:city:Lima"));
    }

    #[test]
    fn test_compute_keys_deterministic() {
        let schema = user_schema();
        let mapper = KeyMapper::new(&schema);
        let record = user("abc", 30, "Lima");
        assert_eq!(mapper.compute_keys(&record), mapper.compute_keys(&record));
    }

    #[test]
    fn test_diff_only_changed_fields() {
        let schema = user_schema();
        let mapper = KeyMapper::new(&schema);

        let diff = mapper.diff_index_entries(&user("abc", 30, "Lima"), &user("abc", 30, "Cusco"));
        assert_eq!(diff.to_remove.len(), 1);
        assert_eq!(diff.to_add.len(), 1);
        assert_eq!(diff.to_remove[0].key(), "user:city:Lima");
        assert_eq!(diff.to_add[0].key(), "user:city:Cusco");
    }

    #[test]
    fn test_diff_unchanged_is_empty() {
        let schema = user_schema();
        let mapper = KeyMapper::new(&schema);
        assert!(mapper
            .diff_index_entries(&user("abc", 30, "Lima"), &user("abc", 30, "Lima"))
            .is_empty());
    }

    #[test]
    fn test_unindexed_field_has_no_entry() {
        let schema = crate::schema::product_schema();
        let mapper = KeyMapper::new(&schema);
        assert!(mapper.entry_for("description", &Value::from("x")).is_none());
        assert!(mapper.entry_for("price", &Value::Integer(2)).is_some());
    }
}
