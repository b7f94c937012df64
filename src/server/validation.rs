//! Request validation utilities for the Aquafarm API.
//!
//! Request bodies implement [`Validate`]; the [`Payload`](crate::server::extract::Payload)
//! extractor runs it after deserialization and turns failures into a 400.

use std::fmt;

/// Maximum length of farm and pond names, matching the `VARCHAR(100)` columns.
pub const NAME_MAX_LEN: usize = 100;

/// Validation error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Implemented by request bodies that carry field constraints.
pub trait Validate {
    fn validate(&self) -> ValidationResult<()>;
}

/// Validate that a string is not empty or whitespace only.
///
/// # Example
/// ```
/// use aquafarm::server::validation::validate_not_empty;
///
/// assert!(validate_not_empty("hello", "name").is_ok());
/// assert!(validate_not_empty("", "name").is_err());
/// assert!(validate_not_empty("   ", "name").is_err());
/// ```
pub fn validate_not_empty(value: &str, field_name: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        Err(ValidationError::new(field_name, "cannot be empty"))
    } else {
        Ok(())
    }
}

/// Validate string length (in characters) is within bounds.
///
/// # Example
/// ```
/// use aquafarm::server::validation::validate_length;
///
/// assert!(validate_length("hello", 1, 10, "name").is_ok());
/// assert!(validate_length("", 1, 10, "name").is_err());
/// assert!(validate_length("a".repeat(100).as_str(), 1, 10, "name").is_err());
/// ```
pub fn validate_length(
    value: &str,
    min: usize,
    max: usize,
    field_name: &str,
) -> ValidationResult<()> {
    let len = value.chars().count();
    if len < min {
        Err(ValidationError::new(
            field_name,
            format!("must be at least {} characters", min),
        ))
    } else if len > max {
        Err(ValidationError::new(
            field_name,
            format!("must be at most {} characters", max),
        ))
    } else {
        Ok(())
    }
}

/// Validate a required entity name: present, non-blank, at most [`NAME_MAX_LEN`] characters.
pub fn validate_name(value: &str, field_name: &str) -> ValidationResult<()> {
    validate_not_empty(value, field_name)?;
    validate_length(value, 1, NAME_MAX_LEN, field_name)
}

/// Validate an optional name - if present, it must satisfy [`validate_name`].
pub fn validate_optional_name(value: Option<&str>, field_name: &str) -> ValidationResult<()> {
    match value {
        Some(v) => validate_name(v, field_name),
        None => Ok(()),
    }
}

/// Validate a reference to another row: ids start at 1.
pub fn validate_reference_id(value: i64, field_name: &str) -> ValidationResult<()> {
    if value > 0 {
        Ok(())
    } else {
        Err(ValidationError::new(field_name, "must be a positive id"))
    }
}

/// Validate an optional body id used for upsert-by-presence: absent or 0 means "create".
pub fn validate_upsert_id(value: Option<i64>, field_name: &str) -> ValidationResult<()> {
    match value {
        Some(id) if id < 0 => Err(ValidationError::new(field_name, "cannot be negative")),
        _ => Ok(()),
    }
}
