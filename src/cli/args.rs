//! CLI argument definitions using clap
//!
//! Commands:
//! - omstore serve [--config <path>] [--host <host>] [--port <port>] [--store <backend>]
//! - omstore check-config [--config <path>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::StoreBackend;

/// omstore - schema-mapped records over a key-value store
#[derive(Parser, Debug)]
#[command(name = "omstore")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server
    Serve {
        /// Path to a JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Bind host (overrides APP_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides APP_PORT)
        #[arg(long)]
        port: Option<u16>,

        /// Storage backend: memory or redis (overrides STORE_BACKEND)
        #[arg(long)]
        store: Option<StoreBackend>,
    },

    /// Resolve and print the effective configuration, then exit
    CheckConfig {
        /// Path to a JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_flags() {
        let cli = Cli::try_parse_from(["omstore", "serve", "--port", "9000", "--store", "redis"]).unwrap();
        match cli.command {
            Command::Serve { port, store, config, host } => {
                assert_eq!(port, Some(9000));
                assert_eq!(store, Some(StoreBackend::Redis));
                assert!(config.is_none());
                assert!(host.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unknown_backend() {
        assert!(Cli::try_parse_from(["omstore", "serve", "--store", "mongo"]).is_err());
    }
}
