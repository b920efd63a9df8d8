//! # HTTP Server Module
//!
//! axum server exposing the record services.
//!
//! # Endpoints
//!
//! - `/`, `/health` - Banner and store health
//! - `/users/*` - User CRUD and search
//! - `/products/*` - Product CRUD and search
//!
//! Status codes: 201 on create; 400 on validation or non-indexed search;
//! 404 on unknown id; 500 on storage failure.

pub mod config;
pub mod errors;
pub mod health_routes;
pub mod record_routes;
pub mod server;
pub mod state;

pub use config::HttpServerConfig;
pub use errors::{ApiError, ApiResult, ErrorResponse};
pub use server::HttpServer;
pub use state::AppState;
