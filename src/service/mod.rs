//! Record services
//!
//! One `RecordService` per record type orchestrates validation, key
//! computation, storage writes and searches.

mod errors;
mod record;

pub use errors::{ServiceError, ServiceResult};
pub use record::RecordService;
