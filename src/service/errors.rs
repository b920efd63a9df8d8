//! Record service errors
//!
//! Collapses schema, planner and storage failures into the taxonomy the
//! HTTP layer maps onto status codes.

use thiserror::Error;

use crate::planner::{PlannerError, PlannerErrorCode};
use crate::schema::{RecordKind, SchemaError, SchemaErrorCode};
use crate::storage::StorageError;

/// Result type for record service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Record service errors
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    /// Bad, missing or undeclared field, or an uncomparable filter operand
    #[error("{0}")]
    Validation(String),

    /// Identifier does not resolve to an active record
    #[error("{} not found: {id}", .kind.label())]
    NotFound { kind: RecordKind, id: String },

    /// Filter references a field without a secondary index
    #[error("{0}")]
    FieldNotIndexed(String),

    /// Record type is not registered
    #[error("{0}")]
    UnknownType(String),

    /// Storage connectivity failure
    #[error("{0}")]
    BackendUnavailable(String),

    /// Anything else: corrupt stored data, registry misconfiguration
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn not_found(kind: RecordKind, id: impl Into<String>) -> Self {
        Self::NotFound { kind, id: id.into() }
    }

    /// Stable code for logs and API bodies
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "OM_VALIDATION_FAILED",
            Self::NotFound { .. } => "OM_NOT_FOUND",
            Self::FieldNotIndexed(_) => "OM_FIELD_NOT_INDEXED",
            Self::UnknownType(_) => "OM_UNKNOWN_TYPE",
            Self::BackendUnavailable(_) => "OM_BACKEND_UNAVAILABLE",
            Self::Internal(_) => "OM_INTERNAL",
        }
    }
}

impl From<SchemaError> for ServiceError {
    fn from(err: SchemaError) -> Self {
        match err.code() {
            SchemaErrorCode::OmValidationFailed => Self::Validation(err.message().to_string()),
            SchemaErrorCode::OmUnknownType => Self::UnknownType(err.message().to_string()),
            SchemaErrorCode::OmSchemaImmutable | SchemaErrorCode::OmInvalidSchema => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<PlannerError> for ServiceError {
    fn from(err: PlannerError) -> Self {
        match err.code() {
            PlannerErrorCode::OmFieldNotIndexed => Self::FieldNotIndexed(err.message().to_string()),
            PlannerErrorCode::OmInvalidFilter => Self::Validation(err.message().to_string()),
        }
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Backend(msg) => Self::BackendUnavailable(msg),
            // A missing key outside a by-id lookup means the store changed underneath us
            StorageError::NotFound(key) => Self::Internal(format!("key disappeared: {}", key)),
        }
    }
}
