//! Input limits applied by the service layer before any write.

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

const fn default_max_name_len() -> usize {
    120
}

const fn default_max_description_len() -> usize {
    4000
}

const fn default_max_comment_len() -> usize {
    2000
}

const fn default_max_points() -> i64 {
    1000
}

/// Configured upper bounds for user-supplied values.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Limits {
    /// Maximum characters in a project name or task title.
    #[serde(default = "default_max_name_len")]
    pub max_name_len: usize,

    /// Maximum characters in a project or task description.
    #[serde(default = "default_max_description_len")]
    pub max_description_len: usize,

    /// Maximum characters in a comment body.
    #[serde(default = "default_max_comment_len")]
    pub max_comment_len: usize,

    /// Largest `max_points` a task may declare.
    #[serde(default = "default_max_points")]
    pub max_points: i64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_name_len: default_max_name_len(),
            max_description_len: default_max_description_len(),
            max_comment_len: default_max_comment_len(),
            max_points: default_max_points(),
        }
    }
}

impl Limits {
    /// Validate a project name or task title: trimmed non-empty, within bounds.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Empty` or `CoreError::TooLong`.
    pub fn check_name(&self, field: &'static str, value: &str) -> Result<(), CoreError> {
        if value.trim().is_empty() {
            return Err(CoreError::Empty { field });
        }
        check_len(field, value, self.max_name_len)
    }

    /// Validate an optional description.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::TooLong` if the description exceeds the limit.
    pub fn check_description(&self, value: &str) -> Result<(), CoreError> {
        check_len("description", value, self.max_description_len)
    }

    /// Validate a comment body: trimmed non-empty, within bounds.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Empty` or `CoreError::TooLong`.
    pub fn check_comment(&self, value: &str) -> Result<(), CoreError> {
        if value.trim().is_empty() {
            return Err(CoreError::Empty { field: "comment" });
        }
        check_len("comment", value, self.max_comment_len)
    }

    /// Validate a task's `max_points` (at least 1, at most the configured cap).
    ///
    /// # Errors
    ///
    /// Returns `CoreError::OutOfRange`.
    pub const fn check_max_points(&self, value: i64) -> Result<(), CoreError> {
        if value < 1 || value > self.max_points {
            return Err(CoreError::OutOfRange {
                field: "max_points",
                min: 1,
                max: self.max_points,
                value,
            });
        }
        Ok(())
    }
}

/// Validate task progress against the task's own ceiling.
///
/// # Errors
///
/// Returns `CoreError::OutOfRange` unless `0 <= points <= max_points`.
pub const fn check_points(points: i64, max_points: i64) -> Result<(), CoreError> {
    if points < 0 || points > max_points {
        return Err(CoreError::OutOfRange {
            field: "points",
            min: 0,
            max: max_points,
            value: points,
        });
    }
    Ok(())
}

fn check_len(field: &'static str, value: &str, max: usize) -> Result<(), CoreError> {
    if value.chars().count() > max {
        return Err(CoreError::TooLong { field, max });
    }
    Ok(())
}
