//! Query translator
//!
//! Turns a filter tree into an ordered list of index lookups followed by an
//! intersection. Plans are deterministic: same schema + filter, same plan.
//!
//! Step order:
//! 1. Bucket lookups for equality atoms (by field, then bucket)
//! 2. Ordered bucket scans for range atoms, one per field
//!
//! Several range atoms on one field are merged into the tightest bounds.
//! An atom on a non-indexed field is rejected; there is no fallback scan.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::index::{index_prefix, record_prefix, IndexEntry, IndexKey};
use crate::schema::{FieldDef, RecordKind, Schema, Value};
use crate::storage::ScanBounds;

use super::ast::Filter;
use super::errors::{PlannerError, PlannerResult};

/// One index lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupStep {
    /// Ids in exactly one bucket
    Bucket { entry: IndexEntry },
    /// Ids in every bucket of `prefix` within inclusive bounds
    Scan {
        field: String,
        prefix: String,
        bounds: ScanBounds,
    },
}

impl LookupStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            LookupStep::Bucket { .. } => "INDEX_EQ",
            LookupStep::Scan { .. } => "INDEX_RANGE",
        }
    }
}

impl fmt::Display for LookupStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupStep::Bucket { entry } => write!(f, "{} {}", self.as_str(), entry.key()),
            LookupStep::Scan { prefix, bounds, .. } => write!(
                f,
                "{} {}[{}..={}]",
                self.as_str(),
                prefix,
                bounds.lower.as_deref().unwrap_or("-"),
                bounds.upper.as_deref().unwrap_or("+"),
            ),
        }
    }
}

/// Immutable query plan
#[derive(Debug, Clone)]
pub struct QueryPlan {
    pub kind: RecordKind,
    /// Prefix scanned when there are no steps
    pub record_prefix: String,
    /// Lookups whose id sets are intersected
    pub steps: Vec<LookupStep>,
}

impl QueryPlan {
    /// Returns true if the plan scans every primary key of the type
    pub fn is_full_scan(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Display for QueryPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_full_scan() {
            return write!(f, "FULL_SCAN {}*", self.record_prefix);
        }
        for step in &self.steps {
            write!(f, "{} -> ", step)?;
        }
        write!(f, "INTERSECT")
    }
}

/// Planner bound to one schema
pub struct QueryPlanner<'a> {
    schema: &'a Schema,
}

impl<'a> QueryPlanner<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Plans a filter, returning an immutable plan or error.
    pub fn plan(&self, filter: &Filter) -> PlannerResult<QueryPlan> {
        let mut equalities: BTreeSet<IndexEntry> = BTreeSet::new();
        let mut ranges: BTreeMap<String, (Option<IndexKey>, Option<IndexKey>)> = BTreeMap::new();

        for atom in filter.atoms() {
            match atom {
                Filter::Equals { field, value } => {
                    let def = self.indexed_field(field)?;
                    let key = self.key_for(def, value)?;
                    equalities.insert(IndexEntry {
                        field: def.name.clone(),
                        prefix: index_prefix(self.schema.kind, &def.name),
                        bucket: key.bucket(),
                    });
                }
                Filter::Range { field, min, max } => {
                    let def = self.indexed_field(field)?;
                    let min = min.as_ref().map(|v| self.key_for(def, v)).transpose()?;
                    let max = max.as_ref().map(|v| self.key_for(def, v)).transpose()?;

                    let bounds = ranges.entry(def.name.clone()).or_insert((None, None));
                    bounds.0 = tighter(bounds.0.take(), min, std::cmp::max);
                    bounds.1 = tighter(bounds.1.take(), max, std::cmp::min);
                }
                Filter::And(_) => unreachable!("atoms() flattens conjunctions"),
            }
        }

        let mut steps: Vec<LookupStep> = equalities
            .into_iter()
            .map(|entry| LookupStep::Bucket { entry })
            .collect();

        steps.extend(ranges.into_iter().map(|(field, (lower, upper))| LookupStep::Scan {
            prefix: index_prefix(self.schema.kind, &field),
            bounds: ScanBounds::new(lower.map(|k| k.bucket()), upper.map(|k| k.bucket())),
            field,
        }));

        Ok(QueryPlan {
            kind: self.schema.kind,
            record_prefix: record_prefix(self.schema.kind),
            steps,
        })
    }

    fn indexed_field(&self, field: &str) -> PlannerResult<&'a FieldDef> {
        self.schema
            .field(field)
            .filter(|def| def.indexed)
            .ok_or_else(|| PlannerError::field_not_indexed(self.schema.kind.prefix(), field))
    }

    fn key_for(&self, def: &FieldDef, value: &Value) -> PlannerResult<IndexKey> {
        let value = value.coerce_to(def.field_type).ok_or_else(|| {
            PlannerError::invalid_filter(
                &def.name,
                format!(
                    "expected {}, got {}",
                    def.field_type.type_name(),
                    value.field_type().type_name()
                ),
            )
        })?;
        Ok(IndexKey::from_value(&value))
    }
}

/// Combines an existing bound with a new one using `pick` (max for lower, min for upper)
fn tighter(
    current: Option<IndexKey>,
    new: Option<IndexKey>,
    pick: fn(IndexKey, IndexKey) -> IndexKey,
) -> Option<IndexKey> {
    match (current, new) {
        (Some(a), Some(b)) => Some(pick(a, b)),
        (a, b) => a.or(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{product_schema, user_schema};

    #[test]
    fn test_empty_filter_is_full_scan() {
        let schema = user_schema();
        let plan = QueryPlanner::new(&schema).plan(&Filter::all()).unwrap();
        assert!(plan.is_full_scan());
        assert_eq!(plan.record_prefix, "user:");
        assert_eq!(plan.to_string(), "FULL_SCAN user:*");
    }

    #[test]
    fn test_equality_is_bucket_lookup() {
        let schema = user_schema();
        let plan = QueryPlanner::new(&schema).plan(&Filter::eq("city", "Lima")).unwrap();
        assert_eq!(plan.steps.len(), 1);
        match &plan.steps[0] {
            LookupStep::Bucket { entry } => assert_eq!(entry.key(), "user:city:Lima"),
            other => panic!("unexpected step {:?}", other),
        }
    }

    #[test]
    fn test_ranges_on_same_field_merge() {
        let schema = user_schema();
        let filter = Filter::gte("age", 31i64)
            .and(Filter::lte("age", 40i64))
            .and(Filter::gte("age", 35i64));
        let plan = QueryPlanner::new(&schema).plan(&filter).unwrap();

        assert_eq!(plan.steps.len(), 1);
        match &plan.steps[0] {
            LookupStep::Scan { field, bounds, .. } => {
                assert_eq!(field, "age");
                assert_eq!(bounds.lower, Some(IndexKey::from_int(35).bucket()));
                assert_eq!(bounds.upper, Some(IndexKey::from_int(40).bucket()));
            }
            other => panic!("unexpected step {:?}", other),
        }
    }

    #[test]
    fn test_equalities_before_ranges() {
        let schema = product_schema();
        let filter = Filter::between("price", 0i64, 10i64).and(Filter::eq("category", "office"));
        let plan = QueryPlanner::new(&schema).plan(&filter).unwrap();

        assert_eq!(plan.steps[0].as_str(), "INDEX_EQ");
        assert_eq!(plan.steps[1].as_str(), "INDEX_RANGE");
        assert!(plan.to_string().ends_with("INTERSECT"));
    }

    #[test]
    fn test_non_indexed_field_rejected() {
        let schema = product_schema();
        let err = QueryPlanner::new(&schema)
            .plan(&Filter::eq("description", "blue"))
            .unwrap_err();
        assert_eq!(err.code().code(), "OM_FIELD_NOT_INDEXED");

        let err = QueryPlanner::new(&schema).plan(&Filter::eq("colour", "blue")).unwrap_err();
        assert_eq!(err.field(), "colour");
    }

    #[test]
    fn test_operand_type_checked() {
        let schema = user_schema();
        let err = QueryPlanner::new(&schema).plan(&Filter::eq("age", "thirty")).unwrap_err();
        assert_eq!(err.code().code(), "OM_INVALID_FILTER");
    }

    #[test]
    fn test_integer_bound_for_float_field() {
        let schema = product_schema();
        let plan = QueryPlanner::new(&schema)
            .plan(&Filter::between("price", 2i64, 5i64))
            .unwrap();
        match &plan.steps[0] {
            LookupStep::Scan { bounds, .. } => {
                assert_eq!(bounds.lower, Some(IndexKey::from_float(2.0).bucket()));
            }
            other => panic!("unexpected step {:?}", other),
        }
    }

    #[test]
    fn test_plan_deterministic() {
        let schema = user_schema();
        let planner = QueryPlanner::new(&schema);
        let filter = Filter::eq("name", "Ana").and(Filter::eq("city", "Lima"));
        assert_eq!(planner.plan(&filter).unwrap().steps, planner.plan(&filter).unwrap().steps);
    }
}
