//! # HTTP Server
//!
//! Combines the record, search and health routers into one axum server.

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::config::HttpServerConfig;
use super::health_routes::health_routes;
use super::record_routes::{product_search_routes, record_routes, user_search_routes};
use super::state::AppState;

/// HTTP server for the record service
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server over the given state
    pub fn new(config: HttpServerConfig, state: AppState) -> Self {
        let router = Self::build_router(&config, state);
        Self { config, router }
    }

    /// Build the combined router with all endpoints
    pub fn build_router(config: &HttpServerConfig, state: AppState) -> Router {
        Router::new()
            .merge(health_routes(state.store.clone()))
            .merge(record_routes(state.users.clone()))
            .merge(user_search_routes(state.users))
            .merge(record_routes(state.products.clone()))
            .merge(product_search_routes(state.products))
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(config.cors_layer()),
            )
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Serve until ctrl-c
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr: SocketAddr = self.config.bind_addr().map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid socket address {}: {}", self.config.socket_addr(), e),
            )
        })?;

        let listener = TcpListener::bind(addr).await?;
        info!(%addr, "HTTP server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("HTTP server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_with_custom_port() {
        let config = HttpServerConfig {
            port: 8080,
            ..Default::default()
        };
        let server = HttpServer::new(config, AppState::in_memory().unwrap());
        assert_eq!(server.socket_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_router_builds() {
        let server = HttpServer::new(HttpServerConfig::default(), AppState::in_memory().unwrap());
        let _router = server.router();
    }
}
