//! Logging setup, powered by tracing-subscriber
//!
//! `RUST_LOG` wins over the configured level when set.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LogFormat;

/// Builds the filter: `RUST_LOG` if present, otherwise the base level plus
/// quieter defaults for chatty dependencies.
pub fn build_env_filter(debug: bool) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    let level = if debug { "debug" } else { "info" };
    let directives = [
        level.to_string(),
        "hyper=warn".to_string(),
        "redis=warn".to_string(),
        format!("tower_http={}", level),
    ];
    EnvFilter::new(directives.join(","))
}

/// Installs the global subscriber.
///
/// Fails if a subscriber is already installed.
pub fn init_logging(debug_enabled: bool, format: LogFormat) -> Result<(), TryInitError> {
    let layer = match format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .boxed(),
        LogFormat::Compact => tracing_subscriber::fmt::layer()
            .compact()
            .with_target(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(build_env_filter(debug_enabled)))
        .try_init()?;

    tracing::debug!(debug_enabled, ?format, "logging initialized");
    Ok(())
}
