//! Comment service.

use crew_core::entities::{Comment, Task};

use super::{Change, Scope};
use crate::error::{Denial, ServiceError};

pub struct CommentService<'a> {
    scope: Scope<'a>,
}

impl<'a> CommentService<'a> {
    #[must_use]
    pub const fn new(scope: Scope<'a>) -> Self {
        Self { scope }
    }

    pub async fn add(&self, task_id: &str, body: &str) -> Result<Change<Comment>, ServiceError> {
        let task = self.member_task(task_id).await?;
        self.scope.limits.check_comment(body)?;

        let store = self.scope.store;
        let comment = store.insert_comment(&task.id, self.scope.me(), body).await?;
        let members = store.project_users(&task.project_id).await?;
        Ok(Change {
            item: comment,
            members,
        })
    }

    pub async fn list(&self, task_id: &str) -> Result<Vec<Comment>, ServiceError> {
        let task = self.member_task(task_id).await?;
        Ok(self.scope.store.list_comments(&task.id).await?)
    }

    /// Delete a comment. The author or the project owner may.
    pub async fn delete(&self, comment_id: &str) -> Result<Change<Comment>, ServiceError> {
        let store = self.scope.store;
        let comment = store
            .get_comment(comment_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("comment", comment_id))?;
        let task = self.member_task(&comment.task_id).await?;

        let me = self.scope.me();
        if comment.author != me {
            self.scope
                .authz()
                .verify_ownership(&task.project_id, me)
                .await
                .map_err(|e| match e {
                    ServiceError::Denied(_) => Denial::NotAuthor {
                        comment_id: comment.id.clone(),
                        user_id: me.to_string(),
                    }
                    .into(),
                    other => other,
                })?;
        }

        store.delete_comment(&comment.id).await?;
        let members = store.project_users(&task.project_id).await?;
        Ok(Change {
            item: comment,
            members,
        })
    }

    async fn member_task(&self, task_id: &str) -> Result<Task, ServiceError> {
        let task = self
            .scope
            .store
            .get_task(task_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("task", task_id))?;
        self.scope
            .authz()
            .verify_membership_of_task(&task, self.scope.me())
            .await?;
        Ok(task)
    }
}
