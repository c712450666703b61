use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A unit of work within a project with a bounded progress counter.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub description: Option<String>,
    /// Current progress, `0 <= points <= max_points`.
    pub points: i64,
    pub max_points: i64,
    /// Assigned member, if any. Always a current member of the project.
    pub assigned_user: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    #[must_use]
    pub fn is_assigned_to(&self, user_id: &str) -> bool {
        self.assigned_user.as_deref() == Some(user_id)
    }
}
