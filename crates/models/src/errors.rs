use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Why a single field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationReason {
    Required,
    InvalidType,
    InvalidEnum,
    UnknownField,
}

impl ValidationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationReason::Required => "required",
            ValidationReason::InvalidType => "invalid_type",
            ValidationReason::InvalidEnum => "invalid_enum",
            ValidationReason::UnknownField => "unknown_field",
        }
    }
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// A rejected field, with the expected type or allow-list when one applies.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct FieldError {
    pub field: String,
    pub reason: ValidationReason,
    pub expected: Option<String>,
}

impl FieldError {
    pub fn new(field: impl Into<String>, reason: ValidationReason) -> Self {
        Self { field: field.into(), reason, expected: None }
    }

    pub fn expecting(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    /// Human-readable message suitable for API clients.
    pub fn message(&self) -> String {
        let field = &self.field;
        match (self.reason, &self.expected) {
            (ValidationReason::Required, _) => format!("{field} is required"),
            (ValidationReason::InvalidType, Some(kind)) => format!("{field} must be a valid {kind}"),
            (ValidationReason::InvalidType, None) => format!("{field} has an invalid type"),
            (ValidationReason::InvalidEnum, Some(allowed)) => format!("{field} must be one of: {allowed}"),
            (ValidationReason::InvalidEnum, None) => format!("{field} is not an allowed value"),
            (ValidationReason::UnknownField, _) => format!("{field} is not a known field"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("validation error: {0}")]
    Validation(#[from] FieldError),
    #[error("invalid resource schema: {0}")]
    Schema(String),
    #[error("database error: {0}")]
    Db(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_field() {
        assert_eq!(FieldError::new("vin", ValidationReason::Required).message(), "vin is required");
        let e = FieldError::new("status", ValidationReason::InvalidEnum).expecting("PENDING, CLOSED");
        assert_eq!(e.message(), "status must be one of: PENDING, CLOSED");
        assert_eq!(e.to_string(), "status: invalid_enum");
    }

    #[test]
    fn reason_serializes_snake_case() {
        let json = serde_json::to_value(ValidationReason::InvalidType).unwrap();
        assert_eq!(json, "invalid_type");
    }
}
