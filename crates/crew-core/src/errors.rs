//! Cross-cutting error types for Crew.
//!
//! Domain-specific errors (`DatabaseError`, `AuthError`, `ServiceError`) live in
//! their own crates. `CoreError` covers what the core types themselves reject.

use thiserror::Error;

/// Errors that can be raised by core type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A field exceeds its configured maximum length.
    #[error("{field} exceeds the maximum length of {max} characters")]
    TooLong { field: &'static str, max: usize },

    /// A required field is empty.
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    /// A numeric field is outside its allowed range.
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
        value: i64,
    },
}
