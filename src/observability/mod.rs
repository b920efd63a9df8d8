//! Observability
//!
//! Structured logging through `tracing`. Service code emits events with the
//! usual macros; this module only installs the subscriber.

mod logging;

pub use logging::{build_env_filter, init_logging};
