//! Project service: lifecycle and membership.

use crew_core::entities::Project;

use super::Scope;
use crate::authz::MemberRemoval;
use crate::error::ServiceError;
use crate::updates::project::ProjectUpdate;

/// Result of removing a member or leaving a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    /// The project after the removal; `users` are the remaining members.
    pub project: Project,
    pub removed_user: String,
    pub unassigned_tasks: Vec<String>,
}

pub struct ProjectService<'a> {
    scope: Scope<'a>,
}

impl<'a> ProjectService<'a> {
    #[must_use]
    pub const fn new(scope: Scope<'a>) -> Self {
        Self { scope }
    }

    /// Create a project owned by the acting user. `members` are added after
    /// the owner, in order, skipping duplicates.
    pub async fn create(
        &self,
        name: &str,
        description: Option<&str>,
        members: &[String],
    ) -> Result<Project, ServiceError> {
        let limits = self.scope.limits;
        limits.check_name("name", name)?;
        if let Some(description) = description {
            limits.check_description(description)?;
        }
        let store = self.scope.store;
        for member in members {
            if store.get_user(member).await?.is_none() {
                return Err(ServiceError::not_found("user", member));
            }
        }

        let id = store.insert_project(name, description, self.scope.me()).await?;
        for member in members {
            store.insert_project_user(&id, member).await?;
        }
        tracing::debug!(project_id = %id, owner = self.scope.me(), "project created");
        self.load(&id).await
    }

    /// Fetch a project the acting user belongs to.
    pub async fn get(&self, project_id: &str) -> Result<Project, ServiceError> {
        let project = self.load(project_id).await?;
        self.scope
            .authz()
            .verify_membership(project_id, self.scope.me())
            .await?;
        Ok(project)
    }

    pub async fn list_for_user(&self) -> Result<Vec<Project>, ServiceError> {
        Ok(self.scope.store.list_projects_for_user(self.scope.me()).await?)
    }

    /// Rename or re-describe. Owner only.
    pub async fn update(&self, project_id: &str, update: &ProjectUpdate) -> Result<Project, ServiceError> {
        self.load(project_id).await?;
        self.scope
            .authz()
            .verify_ownership(project_id, self.scope.me())
            .await?;

        let limits = self.scope.limits;
        if let Some(ref name) = update.name {
            limits.check_name("name", name)?;
        }
        if let Some(Some(ref description)) = update.description {
            limits.check_description(description)?;
        }

        self.scope.store.update_project(project_id, update).await?;
        self.load(project_id).await
    }

    /// Add an existing user. Owner only; adding a current member is a no-op.
    pub async fn add_member(&self, project_id: &str, user_id: &str) -> Result<Project, ServiceError> {
        self.load(project_id).await?;
        self.scope
            .authz()
            .verify_ownership(project_id, self.scope.me())
            .await?;
        let store = self.scope.store;
        if store.get_user(user_id).await?.is_none() {
            return Err(ServiceError::not_found("user", user_id));
        }
        if store.insert_project_user(project_id, user_id).await? {
            store.touch_project(project_id).await?;
        }
        self.load(project_id).await
    }

    pub async fn remove_member(&self, project_id: &str, user_id: &str) -> Result<Removal, ServiceError> {
        let MemberRemoval {
            removed_user,
            unassigned_tasks,
            ..
        } = self
            .scope
            .authz()
            .remove_member(project_id, self.scope.me(), user_id)
            .await?;
        Ok(Removal {
            project: self.load(project_id).await?,
            removed_user,
            unassigned_tasks,
        })
    }

    pub async fn leave(&self, project_id: &str) -> Result<Removal, ServiceError> {
        self.remove_member(project_id, self.scope.me()).await
    }

    /// Delete the project with its tasks and comments. Owner only.
    ///
    /// Returns the project as it was, members included.
    pub async fn delete(&self, project_id: &str) -> Result<Project, ServiceError> {
        let project = self.load(project_id).await?;
        self.scope
            .authz()
            .verify_ownership(project_id, self.scope.me())
            .await?;
        self.scope.store.delete_project(project_id).await?;
        Ok(project)
    }

    async fn load(&self, project_id: &str) -> Result<Project, ServiceError> {
        self.scope
            .store
            .get_project(project_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("project", project_id))
    }
}
