//! Error types for crew-db.

use crew_core::errors::CoreError;
use thiserror::Error;

/// Errors from database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A SQL query failed or returned unparseable data.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// Invalid state encountered (e.g., bad data in DB).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),
}

/// A failed authorization predicate.
///
/// Each variant names the relationship fact that did not hold.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Denial {
    #[error("user {user_id} does not own project {project_id}")]
    NotOwner { project_id: String, user_id: String },

    #[error("user {user_id} is not a member of project {project_id}")]
    NotMember { project_id: String, user_id: String },

    #[error("user {user_id} is not assigned to task {task_id}")]
    NotAssigned { task_id: String, user_id: String },

    #[error("user {user_id} may not unassign task {task_id}")]
    CannotUnassign { task_id: String, user_id: String },

    #[error("task {task_id} is already assigned to {assignee}")]
    AlreadyAssigned { task_id: String, assignee: String },

    #[error("the owner of project {project_id} cannot be removed")]
    OwnerNotRemovable { project_id: String },

    #[error("user {user_id} is not a member of project {project_id}")]
    TargetNotMember { project_id: String, user_id: String },

    #[error("user {user_id} may not delete comment {comment_id}")]
    NotAuthor { comment_id: String, user_id: String },
}

/// Errors surfaced by the service layer and authorization engine.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("forbidden: {0}")]
    Denied(#[from] Denial),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("invalid input: {0}")]
    Validation(#[from] CoreError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl ServiceError {
    pub(crate) fn not_found(entity: &'static str, id: &str) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<libsql::Error> for ServiceError {
    fn from(e: libsql::Error) -> Self {
        Self::Database(e.into())
    }
}
