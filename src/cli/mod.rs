//! CLI module for omstore
//!
//! Provides command-line interface for:
//! - serve: Resolve config, connect the store, serve HTTP
//! - check-config: Print the effective configuration

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{apply_flags, check_config, run, run_command, serve};
pub use errors::{CliError, CliErrorCode, CliResult};
