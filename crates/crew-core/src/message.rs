//! Notification message sent over live connections.
//!
//! Messages only identify what changed. Receivers re-fetch authoritative state
//! through the REST API.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of state change a message describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Added,
    Updated,
    Deleted,
    UserRemoved,
}

impl MessageType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::UserRemoved => "user_removed",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire envelope: `{"type": "...", "subjectId": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub subject_id: String,
}

impl Message {
    #[must_use]
    pub fn new(kind: MessageType, subject_id: impl Into<String>) -> Self {
        Self {
            kind,
            subject_id: subject_id.into(),
        }
    }

    #[must_use]
    pub fn added(subject_id: impl Into<String>) -> Self {
        Self::new(MessageType::Added, subject_id)
    }

    #[must_use]
    pub fn updated(subject_id: impl Into<String>) -> Self {
        Self::new(MessageType::Updated, subject_id)
    }

    #[must_use]
    pub fn deleted(subject_id: impl Into<String>) -> Self {
        Self::new(MessageType::Deleted, subject_id)
    }

    #[must_use]
    pub fn user_removed(user_id: impl Into<String>) -> Self {
        Self::new(MessageType::UserRemoved, user_id)
    }
}
