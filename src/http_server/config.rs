//! HTTP listener settings
//!
//! An empty `cors_origins` list allows any origin.

use std::net::{AddrParseError, SocketAddr};

use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpServerConfig {
    /// Listen host (default: "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,

    /// Listen port (default: 8000)
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

impl HttpServerConfig {
    /// `host:port` as written in the config
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Parsed listen address; the host must be an IP literal
    pub fn bind_addr(&self) -> Result<SocketAddr, AddrParseError> {
        self.socket_addr().parse()
    }

    /// Origins that parse as header values; the rest are logged and dropped
    pub fn allowed_origins(&self) -> Vec<axum::http::HeaderValue> {
        self.cors_origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %origin, "ignoring unparseable CORS origin");
                    None
                }
            })
            .collect()
    }

    pub fn cors_layer(&self) -> CorsLayer {
        let origin = if self.cors_origins.is_empty() {
            AllowOrigin::from(Any)
        } else {
            AllowOrigin::list(self.allowed_origins())
        };

        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
