use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A named collection of tasks shared among members, with exactly one owner.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// User id of the owner. Always contained in `users`.
    pub owner: String,
    /// Member user ids, ordered by join time.
    pub users: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    #[must_use]
    pub fn is_member(&self, user_id: &str) -> bool {
        self.users.iter().any(|u| u == user_id)
    }

    #[must_use]
    pub fn is_owner(&self, user_id: &str) -> bool {
        self.owner == user_id
    }

    /// Whether task progress is restricted to the task's assignee.
    ///
    /// A single-member project never requires per-task assignment.
    #[must_use]
    pub fn assignment_required(&self) -> bool {
        self.users.len() != 1
    }
}
