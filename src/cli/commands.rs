//! CLI command implementations
//!
//! `serve` boot sequence:
//! 1. Resolve configuration (file, env, flags)
//! 2. Install the log subscriber
//! 3. Connect the store and build the record services
//! 4. Serve HTTP until ctrl-c

use std::path::Path;

use tracing::info;

use crate::config::{AppConfig, StoreBackend};
use crate::http_server::{AppState, HttpServer};
use crate::observability::init_logging;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Run a parsed command
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { config, host, port, store } => {
            let mut config = AppConfig::load(config.as_deref())?;
            apply_flags(&mut config, host, port, store);
            serve(config)
        }
        Command::CheckConfig { config } => check_config(config.as_deref()),
    }
}

/// CLI flags take precedence over file and environment
pub fn apply_flags(config: &mut AppConfig, host: Option<String>, port: Option<u16>, store: Option<StoreBackend>) {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(store) = store {
        config.store.backend = store;
    }
}

/// Start the HTTP server and block until it stops
pub fn serve(config: AppConfig) -> CliResult<()> {
    init_logging(config.debug, config.log_format)
        .map_err(|e| CliError::boot_failed(format!("Failed to install log subscriber: {}", e)))?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        let state = AppState::connect(&config.store).await?;
        let server = HttpServer::new(config.server.clone(), state);
        info!(
            addr = %server.socket_addr(),
            backend = %config.store.backend,
            debug = config.debug,
            "starting omstore"
        );

        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}

/// Print the effective configuration as JSON, password masked
pub fn check_config(path: Option<&Path>) -> CliResult<()> {
    let mut config = AppConfig::load(path)?;
    if config.store.password.is_some() {
        config.store.password = Some("***".to_string());
    }
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
