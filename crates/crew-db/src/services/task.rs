//! Task service: CRUD, progress, and assignment.

use crew_core::entities::Task;
use crew_core::limits::check_points;

use super::{Change, Scope};
use crate::error::{Denial, ServiceError};
use crate::updates::task::TaskUpdate;

pub struct TaskService<'a> {
    scope: Scope<'a>,
}

impl<'a> TaskService<'a> {
    #[must_use]
    pub const fn new(scope: Scope<'a>) -> Self {
        Self { scope }
    }

    pub async fn create(
        &self,
        project_id: &str,
        title: &str,
        description: Option<&str>,
        max_points: i64,
    ) -> Result<Change<Task>, ServiceError> {
        let store = self.scope.store;
        if store.get_project(project_id).await?.is_none() {
            return Err(ServiceError::not_found("project", project_id));
        }
        self.scope
            .authz()
            .verify_membership(project_id, self.scope.me())
            .await?;

        let limits = self.scope.limits;
        limits.check_name("title", title)?;
        if let Some(description) = description {
            limits.check_description(description)?;
        }
        limits.check_max_points(max_points)?;

        let task = store.insert_task(project_id, title, description, max_points).await?;
        self.change(task).await
    }

    pub async fn get(&self, task_id: &str) -> Result<Task, ServiceError> {
        let task = self.load(task_id).await?;
        self.scope
            .authz()
            .verify_membership_of_task(&task, self.scope.me())
            .await?;
        Ok(task)
    }

    pub async fn list(&self, project_id: &str) -> Result<Vec<Task>, ServiceError> {
        let store = self.scope.store;
        if store.get_project(project_id).await?.is_none() {
            return Err(ServiceError::not_found("project", project_id));
        }
        self.scope
            .authz()
            .verify_membership(project_id, self.scope.me())
            .await?;
        Ok(store.list_tasks(project_id).await?)
    }

    /// Edit title, description, or ceiling. Any member may.
    pub async fn update(&self, task_id: &str, update: &TaskUpdate) -> Result<Change<Task>, ServiceError> {
        let task = self.get(task_id).await?;

        let limits = self.scope.limits;
        if let Some(ref title) = update.title {
            limits.check_name("title", title)?;
        }
        if let Some(Some(ref description)) = update.description {
            limits.check_description(description)?;
        }
        if let Some(max_points) = update.max_points {
            limits.check_max_points(max_points)?;
        }

        self.scope.store.update_task(&task.id, update).await?;
        self.reload(&task.id).await
    }

    /// Record progress. Requires [`verify_can_progress`](crate::authz::Authorizer::verify_can_progress).
    pub async fn set_points(&self, task_id: &str, points: i64) -> Result<Change<Task>, ServiceError> {
        let task = self.load(task_id).await?;
        self.scope
            .authz()
            .verify_can_progress(&task, self.scope.me())
            .await?;
        check_points(points, task.max_points)?;

        self.scope.store.set_task_points(&task.id, points).await?;
        self.reload(&task.id).await
    }

    /// Take an unassigned task. Re-assigning to oneself is a no-op.
    pub async fn assign_self(&self, task_id: &str) -> Result<Change<Task>, ServiceError> {
        let task = self.get(task_id).await?;
        let me = self.scope.me();
        match task.assigned_user.as_deref() {
            Some(current) if current == me => {}
            Some(current) => {
                return Err(Denial::AlreadyAssigned {
                    task_id: task.id.clone(),
                    assignee: current.to_string(),
                }
                .into());
            }
            None => {
                self.scope.store.set_task_assignee(&task.id, Some(me)).await?;
            }
        }
        self.reload(&task.id).await
    }

    pub async fn unassign(&self, task_id: &str) -> Result<Change<Task>, ServiceError> {
        let task = self.get(task_id).await?;
        self.scope
            .authz()
            .verify_can_unassign(&task, self.scope.me())
            .await?;
        if task.assigned_user.is_some() {
            self.scope.store.set_task_assignee(&task.id, None).await?;
        }
        self.reload(&task.id).await
    }

    /// Delete a task and its comments. Any member may.
    pub async fn delete(&self, task_id: &str) -> Result<Change<Task>, ServiceError> {
        let task = self.get(task_id).await?;
        self.scope.store.delete_task(&task.id).await?;
        self.change(task).await
    }

    async fn load(&self, task_id: &str) -> Result<Task, ServiceError> {
        self.scope
            .store
            .get_task(task_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("task", task_id))
    }

    async fn reload(&self, task_id: &str) -> Result<Change<Task>, ServiceError> {
        let task = self.load(task_id).await?;
        self.change(task).await
    }

    async fn change(&self, task: Task) -> Result<Change<Task>, ServiceError> {
        let members = self.scope.store.project_users(&task.project_id).await?;
        Ok(Change { item: task, members })
    }
}
