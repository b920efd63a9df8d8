//! Record HTTP Routes
//!
//! CRUD endpoints for every record type, plus the fixed search endpoints of
//! users and products.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::planner::Filter;
use crate::schema::{Record, RecordKind};
use crate::service::RecordService;

use super::errors::{ApiError, ApiResult};

type ServiceState = State<Arc<RecordService>>;

/// Delete confirmation body
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
}

/// Collection path for a record type: `/users`, `/products`
pub fn collection_path(kind: RecordKind) -> String {
    format!("/{}s", kind.prefix())
}

/// `POST|GET /<type>/`, `GET|PUT|DELETE /<type>/:id`
pub fn record_routes(service: Arc<RecordService>) -> Router {
    let base = collection_path(service.kind());
    Router::new()
        .route(&base, get(list_records).post(create_record))
        .route(&format!("{}/", base), get(list_records).post(create_record))
        .route(
            &format!("{}/:id", base),
            get(read_record).put(update_record).delete(delete_record),
        )
        .with_state(service)
}

/// `GET /users/search/by-city/:city`, `GET /users/search/by-age/:min/:max`
pub fn user_search_routes(users: Arc<RecordService>) -> Router {
    Router::new()
        .route("/users/search/by-city/:city", get(users_by_city))
        .route("/users/search/by-age/:min/:max", get(users_by_age))
        .with_state(users)
}

/// `GET /products/search/by-category/:category`, `GET /products/search/in-stock`,
/// `GET /products/search/price-range/:min/:max`
pub fn product_search_routes(products: Arc<RecordService>) -> Router {
    Router::new()
        .route("/products/search/by-category/:category", get(products_by_category))
        .route("/products/search/in-stock", get(products_in_stock))
        .route("/products/search/price-range/:min/:max", get(products_by_price))
        .with_state(products)
}

// ==================
// CRUD Handlers
// ==================

async fn create_record(
    State(service): ServiceState,
    body: Result<Json<JsonValue>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Record>)> {
    let Json(body) = body.map_err(|e| ApiError::InvalidBody(e.body_text()))?;
    let record = service.create(&body).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn list_records(State(service): ServiceState) -> ApiResult<Json<Vec<Record>>> {
    Ok(Json(service.list().await?))
}

async fn read_record(State(service): ServiceState, Path(id): Path<String>) -> ApiResult<Json<Record>> {
    Ok(Json(service.read(&id).await?))
}

async fn update_record(
    State(service): ServiceState,
    Path(id): Path<String>,
    body: Result<Json<JsonValue>, JsonRejection>,
) -> ApiResult<Json<Record>> {
    let Json(body) = body.map_err(|e| ApiError::InvalidBody(e.body_text()))?;
    Ok(Json(service.update(&id, &body).await?))
}

async fn delete_record(
    State(service): ServiceState,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    service.delete(&id).await?;
    Ok(Json(DeleteResponse {
        message: format!("{} deleted successfully", service.kind().label()),
    }))
}

// ==================
// Search Handlers
// ==================

async fn users_by_city(State(users): ServiceState, Path(city): Path<String>) -> ApiResult<Json<Vec<Record>>> {
    Ok(Json(users.search(&Filter::eq("city", city)).await?))
}

async fn users_by_age(
    State(users): ServiceState,
    params: Result<Path<(i64, i64)>, PathRejection>,
) -> ApiResult<Json<Vec<Record>>> {
    let Path((min, max)) = params.map_err(|e| ApiError::InvalidParam(e.body_text()))?;
    Ok(Json(users.search(&Filter::between("age", min, max)).await?))
}

async fn products_by_category(
    State(products): ServiceState,
    Path(category): Path<String>,
) -> ApiResult<Json<Vec<Record>>> {
    Ok(Json(products.search(&Filter::eq("category", category)).await?))
}

async fn products_in_stock(State(products): ServiceState) -> ApiResult<Json<Vec<Record>>> {
    Ok(Json(products.search(&Filter::eq("in_stock", true)).await?))
}

async fn products_by_price(
    State(products): ServiceState,
    params: Result<Path<(f64, f64)>, PathRejection>,
) -> ApiResult<Json<Vec<Record>>> {
    let Path((min, max)) = params.map_err(|e| ApiError::InvalidParam(e.body_text()))?;
    if !min.is_finite() || !max.is_finite() {
        return Err(ApiError::InvalidParam("price bounds must be finite numbers".to_string()));
    }
    Ok(Json(products.search(&Filter::between("price", min, max)).await?))
}
