//! omstore - schema-mapped records over a key-value store
//!
//! Records are validated against a fixed schema table, stored as flat hashes
//! under `<type>:<id>` and indexed per field so that equality and range
//! searches never scan every record.

pub mod cli;
pub mod config;
pub mod http_server;
pub mod index;
pub mod observability;
pub mod planner;
pub mod schema;
pub mod service;
pub mod storage;
