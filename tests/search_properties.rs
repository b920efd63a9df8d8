//! Search Property Tests
//!
//! Tests for query translation and execution:
//! - Empty filter returns every active record regardless of insertion order
//! - Inclusive ranges return exactly the records within bounds
//! - Non-indexed fields fail instead of scanning
//! - Stale index entries are skipped

use std::collections::BTreeSet;
use std::sync::Arc;

use omstore::index::primary_key;
use omstore::planner::{Filter, QueryPlanner};
use omstore::schema::{product_schema, Record, RecordKind, SchemaRegistry, Value};
use omstore::service::{RecordService, ServiceError};
use omstore::storage::{MemoryStore, StorageGateway};
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn service(kind: RecordKind) -> (RecordService, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let registry = Arc::new(SchemaRegistry::builtin().unwrap());
    (RecordService::new(kind, registry, store.clone()).unwrap(), store)
}

async fn add_user(users: &RecordService, name: &str, age: i64, city: &str) -> Record {
    let email = format!("{}@example.com", name.to_lowercase());
    users
        .create(&json!({"name": name, "email": email, "age": age, "city": city}))
        .await
        .unwrap()
}

async fn add_product(products: &RecordService, title: &str, price: f64, category: &str) -> Record {
    products
        .create(&json!({"title": title, "description": "", "price": price, "category": category}))
        .await
        .unwrap()
}

fn ids(records: &[Record]) -> BTreeSet<String> {
    records.iter().map(|r| r.id.clone()).collect()
}

// =============================================================================
// Full Scan
// =============================================================================

/// Empty filter returns everything, in identifier order.
#[tokio::test]
async fn test_empty_filter_returns_all() {
    let (users, _) = service(RecordKind::User);
    let mut created = Vec::new();
    for (name, age) in [("Cy", 50), ("Ana", 30), ("Bo", 41)] {
        created.push(add_user(&users, name, age, "Lima").await);
    }

    let all = users.search(&Filter::all()).await.unwrap();
    assert_eq!(ids(&all), ids(&created));

    let order: Vec<&str> = all.iter().map(|r| r.id.as_str()).collect();
    let mut sorted = order.clone();
    sorted.sort();
    assert_eq!(order, sorted);
}

// =============================================================================
// Ranges
// =============================================================================

/// Range bounds are inclusive on both ends.
#[tokio::test]
async fn test_age_range_inclusive() {
    let (users, _) = service(RecordKind::User);
    let mut by_age = Vec::new();
    for age in [1, 9, 10, 30, 31, 40, 41, 100, 120] {
        by_age.push((age, add_user(&users, &format!("U{}", age), age, "Lima").await));
    }

    for (min, max) in [(31, 40), (10, 100), (1, 120), (41, 41), (121, 130)] {
        let hits = users.search(&Filter::between("age", min, max)).await.unwrap();
        let expected: BTreeSet<String> = by_age
            .iter()
            .filter(|(age, _)| *age >= min && *age <= max)
            .map(|(_, r)| r.id.clone())
            .collect();
        assert_eq!(ids(&hits), expected, "range {}..={}", min, max);
    }
}

/// Float ranges order correctly, including integer bounds.
#[tokio::test]
async fn test_price_range() {
    let (products, _) = service(RecordKind::Product);
    let free = add_product(&products, "Sticker", 0.0, "office").await;
    let pen = add_product(&products, "Pen", 1.5, "office").await;
    let lamp = add_product(&products, "Lamp", 25.0, "home").await;
    let desk = add_product(&products, "Desk", 250.0, "office").await;

    let hits = products.search(&Filter::between("price", 0i64, 2i64)).await.unwrap();
    assert_eq!(ids(&hits), ids(&[free.clone(), pen.clone()]));

    let hits = products.search(&Filter::gte("price", 25.0)).await.unwrap();
    assert_eq!(ids(&hits), ids(&[lamp.clone(), desk.clone()]));

    let hits = products.search(&Filter::lte("price", 1.5)).await.unwrap();
    assert_eq!(ids(&hits), ids(&[free, pen]));
}

/// Inverted bounds yield an empty result rather than an error.
#[tokio::test]
async fn test_inverted_range_empty() {
    let (users, _) = service(RecordKind::User);
    add_user(&users, "Ana", 30, "Lima").await;

    assert!(users.search(&Filter::between("age", 40i64, 20i64)).await.unwrap().is_empty());
}

// =============================================================================
// Conjunctions
// =============================================================================

/// AND of equality and range intersects the id sets.
#[tokio::test]
async fn test_conjunction() {
    let (products, _) = service(RecordKind::Product);
    let pen = add_product(&products, "Pen", 1.5, "office").await;
    add_product(&products, "Desk", 250.0, "office").await;
    add_product(&products, "Candle", 2.0, "home").await;

    let filter = Filter::eq("category", "office").and(Filter::lte("price", 10.0));
    let hits = products.search(&filter).await.unwrap();
    assert_eq!(ids(&hits), ids(&[pen]));
}

/// Several ranges on one field narrow to the tightest bounds.
#[tokio::test]
async fn test_merged_ranges() {
    let (users, _) = service(RecordKind::User);
    add_user(&users, "Ana", 30, "Lima").await;
    let bo = add_user(&users, "Bo", 35, "Lima").await;
    add_user(&users, "Cy", 45, "Lima").await;

    let filter = Filter::gte("age", 20i64)
        .and(Filter::gte("age", 33i64))
        .and(Filter::lte("age", 40i64));
    assert_eq!(ids(&users.search(&filter).await.unwrap()), ids(&[bo]));
}

/// Boolean index serves the in-stock query.
#[tokio::test]
async fn test_boolean_index() {
    let (products, _) = service(RecordKind::Product);
    let pen = add_product(&products, "Pen", 1.5, "office").await;
    let desk = add_product(&products, "Desk", 250.0, "office").await;
    products.update(&desk.id, &json!({"in_stock": false})).await.unwrap();

    let hits = products.search(&Filter::eq("in_stock", true)).await.unwrap();
    assert_eq!(ids(&hits), ids(&[pen]));
}

// =============================================================================
// Failures
// =============================================================================

/// Non-indexed fields are rejected before any storage access.
#[tokio::test]
async fn test_non_indexed_field_rejected() {
    let (products, store) = service(RecordKind::Product);
    add_product(&products, "Pen", 1.5, "office").await;
    store.set_available(false);

    let err = products.search(&Filter::eq("description", "")).await.unwrap_err();
    assert!(matches!(err, ServiceError::FieldNotIndexed(_)));

    let err = QueryPlanner::new(&product_schema())
        .plan(&Filter::eq("description", ""))
        .unwrap_err();
    assert_eq!(err.field(), "description");
}

/// Stale index entries are skipped, not surfaced.
#[tokio::test]
async fn test_stale_entries_skipped() {
    let (users, store) = service(RecordKind::User);
    let ana = add_user(&users, "Ana", 30, "Lima").await;
    let bo = add_user(&users, "Bo", 31, "Lima").await;

    store.delete(&primary_key(RecordKind::User, &ana.id)).await.unwrap();

    let hits = users.search(&Filter::eq("city", "Lima")).await.unwrap();
    assert_eq!(ids(&hits), ids(&[bo]));
}

/// Index hits whose stored value no longer matches are dropped.
#[tokio::test]
async fn test_outdated_entries_filtered() {
    let (users, store) = service(RecordKind::User);
    let ana = add_user(&users, "Ana", 30, "Lima").await;

    // Rewrite the primary record without touching the index
    let mut raw = store.get(&primary_key(RecordKind::User, &ana.id)).await.unwrap();
    raw.insert("city".to_string(), "Quito".to_string());
    store.put(&primary_key(RecordKind::User, &ana.id), &raw).await.unwrap();

    assert!(users.search(&Filter::eq("city", "Lima")).await.unwrap().is_empty());
    let read = users.read(&ana.id).await.unwrap();
    assert_eq!(read.get("city"), Some(&Value::from("Quito")));
}

/// Backend failure during search is not masked.
#[tokio::test]
async fn test_backend_failure_surfaces() {
    let (users, store) = service(RecordKind::User);
    add_user(&users, "Ana", 30, "Lima").await;
    store.set_available(false);

    assert!(matches!(
        users.search(&Filter::eq("city", "Lima")).await,
        Err(ServiceError::BackendUnavailable(_))
    ));
}
