//! Validation error types

use std::fmt;

/// Validation error for domain models and request payloads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Field is empty (or whitespace only) when it shouldn't be
    Empty { field: &'static str },

    /// Field exceeds maximum length
    TooLong { field: &'static str, max: usize },

    /// Field was explicitly `null` but the column is not nullable
    Null { field: &'static str },

    /// Value doesn't match required format (e.g., a path id)
    InvalidFormat { field: &'static str, reason: &'static str },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{} cannot be empty", field),
            Self::TooLong { field, max } => {
                write!(f, "{} exceeds maximum length of {} characters", field, max)
            }
            Self::Null { field } => write!(f, "{} cannot be null", field),
            Self::InvalidFormat { field, reason } => {
                write!(f, "{}: {}", field, reason)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Check a required short-text field: non-blank and at most `max` characters.
///
/// Length is counted in characters to match `VARCHAR(n)` semantics.
pub(crate) fn required_text(
    s: &str,
    field: &'static str,
    max: usize,
) -> Result<(), ValidationError> {
    if s.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }

    storable(s, field)?;

    if s.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }

    Ok(())
}

/// PostgreSQL text columns cannot hold U+0000.
pub(crate) fn storable(s: &str, field: &'static str) -> Result<(), ValidationError> {
    if s.contains('\0') {
        return Err(ValidationError::InvalidFormat {
            field,
            reason: "must not contain NUL characters",
        });
    }
    Ok(())
}

/// Validate free-form text (descriptions, notes). Any length, no NULs.
pub fn free_text(s: String, field: &'static str) -> Result<String, ValidationError> {
    storable(&s, field)?;
    Ok(s)
}
