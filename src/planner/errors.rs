//! Planner error types
//!
//! Error codes:
//! - OM_FIELD_NOT_INDEXED (REJECT)
//! - OM_INVALID_FILTER (REJECT)

use std::fmt;

/// Planner-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerErrorCode {
    /// Filter references a field without a secondary index
    OmFieldNotIndexed,
    /// Filter operand cannot be compared with the field type
    OmInvalidFilter,
}

impl PlannerErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            PlannerErrorCode::OmFieldNotIndexed => "OM_FIELD_NOT_INDEXED",
            PlannerErrorCode::OmInvalidFilter => "OM_INVALID_FILTER",
        }
    }
}

impl fmt::Display for PlannerErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Planner error type with full context
#[derive(Debug, Clone)]
pub struct PlannerError {
    code: PlannerErrorCode,
    message: String,
    field: String,
}

impl PlannerError {
    /// Create a field-not-indexed error
    pub fn field_not_indexed(record_type: &str, field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            code: PlannerErrorCode::OmFieldNotIndexed,
            message: format!("Field '{}' of '{}' is not indexed", field, record_type),
            field,
        }
    }

    /// Create an invalid filter error
    pub fn invalid_filter(field: impl Into<String>, reason: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            code: PlannerErrorCode::OmInvalidFilter,
            message: format!("Invalid filter on '{}': {}", field, reason.into()),
            field,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> PlannerErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the offending field
    pub fn field(&self) -> &str {
        &self.field
    }
}

impl fmt::Display for PlannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for PlannerError {}

/// Result type for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(PlannerErrorCode::OmFieldNotIndexed.code(), "OM_FIELD_NOT_INDEXED");
        assert_eq!(PlannerErrorCode::OmInvalidFilter.code(), "OM_INVALID_FILTER");
    }

    #[test]
    fn test_display_names_field() {
        let err = PlannerError::field_not_indexed("product", "description");
        assert_eq!(err.field(), "description");
        assert!(err.to_string().contains("OM_FIELD_NOT_INDEXED"));
        assert!(err.to_string().contains("description"));
    }
}
