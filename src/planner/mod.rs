//! Query translator
//!
//! Declarative filters are compiled into index lookups and executed against
//! the storage gateway.
//!
//! # Design Principles
//!
//! - Deterministic: same schema and filter produce the same plan
//! - Indexed only: every atom must target an indexed field
//! - Explicit: an empty filter is a full scan of the record prefix, nothing else is
//!
//! # Step Order
//!
//! 1. Equality bucket lookups
//! 2. Range scans, one per field, tightest merged bounds

mod ast;
mod errors;
mod executor;
mod planner;

pub use ast::Filter;
pub use errors::{PlannerError, PlannerErrorCode, PlannerResult};
pub use executor::PlanExecutor;
pub use planner::{LookupStep, QueryPlan, QueryPlanner};
