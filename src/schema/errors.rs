//! Schema error types
//!
//! Error codes:
//! - OM_UNKNOWN_TYPE (REJECT)
//! - OM_VALIDATION_FAILED (REJECT)
//! - OM_SCHEMA_IMMUTABLE (FATAL)
//! - OM_INVALID_SCHEMA (FATAL)

use std::fmt;

/// Severity levels for schema errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Client request rejected
    Reject,
    /// Startup must abort
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Record type not registered
    OmUnknownType,
    /// Field set violates schema
    OmValidationFailed,
    /// Attempt to register a type twice
    OmSchemaImmutable,
    /// Schema definition is malformed
    OmInvalidSchema,
}

impl SchemaErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::OmUnknownType => "OM_UNKNOWN_TYPE",
            SchemaErrorCode::OmValidationFailed => "OM_VALIDATION_FAILED",
            SchemaErrorCode::OmSchemaImmutable => "OM_SCHEMA_IMMUTABLE",
            SchemaErrorCode::OmInvalidSchema => "OM_INVALID_SCHEMA",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            SchemaErrorCode::OmSchemaImmutable | SchemaErrorCode::OmInvalidSchema => Severity::Fatal,
            _ => Severity::Reject,
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Validation failure details
#[derive(Debug, Clone)]
pub struct ValidationDetails {
    /// Field name
    pub field: String,
    /// Expected type or condition
    pub expected: String,
    /// Actual value or type found
    pub actual: String,
}

impl ValidationDetails {
    pub fn new(field: impl Into<String>, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::new(field, "field to be present", "missing")
    }

    pub fn extra_field(field: impl Into<String>) -> Self {
        Self::new(field, "no undeclared fields", "extra field present")
    }

    pub fn type_mismatch(field: impl Into<String>, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::new(field, expected, actual)
    }

    pub fn null_value(field: impl Into<String>) -> Self {
        Self::new(field, "non-null value", "null")
    }
}

impl fmt::Display for ValidationDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field '{}': expected {}, got {}", self.field, self.expected, self.actual)
    }
}

/// Schema error type with full context
#[derive(Debug, Clone)]
pub struct SchemaError {
    code: SchemaErrorCode,
    message: String,
    details: Option<ValidationDetails>,
}

impl SchemaError {
    /// Create an unknown type error
    pub fn unknown_type(name: impl fmt::Display) -> Self {
        Self {
            code: SchemaErrorCode::OmUnknownType,
            message: format!("Record type '{}' is not registered", name),
            details: None,
        }
    }

    /// Create a validation failed error
    pub fn validation_failed(details: ValidationDetails) -> Self {
        Self {
            code: SchemaErrorCode::OmValidationFailed,
            message: format!("Validation failed: {}", details),
            details: Some(details),
        }
    }

    /// Create a schema immutable error
    pub fn schema_immutable(name: impl fmt::Display) -> Self {
        Self {
            code: SchemaErrorCode::OmSchemaImmutable,
            message: format!("Record type '{}' is already registered", name),
            details: None,
        }
    }

    /// Create an invalid schema error
    pub fn invalid_schema(name: impl fmt::Display, reason: impl Into<String>) -> Self {
        Self {
            code: SchemaErrorCode::OmInvalidSchema,
            message: format!("Invalid schema for '{}': {}", name, reason.into()),
            details: None,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns validation details if applicable
    pub fn details(&self) -> Option<&ValidationDetails> {
        self.details.as_ref()
    }

    pub fn is_validation(&self) -> bool {
        self.code == SchemaErrorCode::OmValidationFailed
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.severity(), self.code.code(), self.message)
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(SchemaErrorCode::OmUnknownType.code(), "OM_UNKNOWN_TYPE");
        assert_eq!(SchemaErrorCode::OmValidationFailed.code(), "OM_VALIDATION_FAILED");
        assert_eq!(SchemaErrorCode::OmSchemaImmutable.code(), "OM_SCHEMA_IMMUTABLE");
        assert_eq!(SchemaErrorCode::OmInvalidSchema.code(), "OM_INVALID_SCHEMA");
    }

    #[test]
    fn test_severity_levels() {
        assert_eq!(SchemaErrorCode::OmValidationFailed.severity(), Severity::Reject);
        assert_eq!(SchemaErrorCode::OmUnknownType.severity(), Severity::Reject);
        assert_eq!(SchemaErrorCode::OmSchemaImmutable.severity(), Severity::Fatal);
    }

    #[test]
    fn test_validation_display() {
        let err = SchemaError::validation_failed(ValidationDetails::type_mismatch("age", "integer", "string"));
        let display = format!("{}", err);
        assert!(display.contains("OM_VALIDATION_FAILED"));
        assert!(display.contains("age"));
        assert!(display.contains("integer"));
        assert!(err.is_validation());
    }
}
