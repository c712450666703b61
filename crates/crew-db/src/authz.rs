//! Authorization engine.
//!
//! Predicates over project ownership, membership, and task assignment. Every
//! check reads through the request transaction, so it sees the request's own
//! earlier writes and nothing uncommitted from anyone else.
//!
//! Predicates return `Ok(())` or [`ServiceError::Denied`] naming the fact that
//! did not hold. A missing project surfaces as [`ServiceError::NotFound`].

use crew_core::entities::Task;

use crate::TxStore;
use crate::error::{Denial, ServiceError};

/// Outcome of a successful [`Authorizer::remove_member`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRemoval {
    pub project_id: String,
    pub removed_user: String,
    /// Tasks the removed user was force-unassigned from.
    pub unassigned_tasks: Vec<String>,
}

/// Stateless view over a request transaction.
#[derive(Clone, Copy)]
pub struct Authorizer<'tx> {
    store: &'tx TxStore,
}

impl<'tx> Authorizer<'tx> {
    #[must_use]
    pub const fn new(store: &'tx TxStore) -> Self {
        Self { store }
    }

    pub async fn verify_ownership(&self, project_id: &str, user_id: &str) -> Result<(), ServiceError> {
        let owner = self
            .store
            .project_owner(project_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("project", project_id))?;
        if owner != user_id {
            return Err(Denial::NotOwner {
                project_id: project_id.to_string(),
                user_id: user_id.to_string(),
            }
            .into());
        }
        Ok(())
    }

    pub async fn verify_membership(&self, project_id: &str, user_id: &str) -> Result<(), ServiceError> {
        if !self.store.is_project_member(project_id, user_id).await? {
            return Err(Denial::NotMember {
                project_id: project_id.to_string(),
                user_id: user_id.to_string(),
            }
            .into());
        }
        Ok(())
    }

    pub async fn verify_membership_of_task(&self, task: &Task, user_id: &str) -> Result<(), ServiceError> {
        self.verify_membership(&task.project_id, user_id).await
    }

    /// Strict check: the user is the task's assignee.
    #[allow(clippy::unused_self)]
    pub fn verify_assigned(&self, task: &Task, user_id: &str) -> Result<(), ServiceError> {
        if !task.is_assigned_to(user_id) {
            return Err(Denial::NotAssigned {
                task_id: task.id.clone(),
                user_id: user_id.to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// The assignee may always drop a task; the project owner may unassign anyone.
    pub async fn verify_can_unassign(&self, task: &Task, user_id: &str) -> Result<(), ServiceError> {
        if task.is_assigned_to(user_id) {
            return Ok(());
        }
        match self.verify_ownership(&task.project_id, user_id).await {
            Err(ServiceError::Denied(_)) => Err(Denial::CannotUnassign {
                task_id: task.id.clone(),
                user_id: user_id.to_string(),
            }
            .into()),
            other => other,
        }
    }

    /// True unless the project has exactly one member.
    pub async fn assignment_required(&self, project_id: &str) -> Result<bool, ServiceError> {
        Ok(self.store.project_member_count(project_id).await? != 1)
    }

    pub async fn assignment_required_for_task(&self, task: &Task) -> Result<bool, ServiceError> {
        self.assignment_required(&task.project_id).await
    }

    /// Member, and the assignee whenever assignment is required.
    pub async fn verify_can_progress(&self, task: &Task, user_id: &str) -> Result<(), ServiceError> {
        self.verify_membership_of_task(task, user_id).await?;
        if self.assignment_required_for_task(task).await? {
            self.verify_assigned(task, user_id)?;
        }
        Ok(())
    }

    /// Remove `target` from the project on behalf of `requester`.
    ///
    /// Both must be members. The owner can never be removed. Anyone may
    /// remove themselves; removing someone else takes ownership. The target is
    /// unassigned from all of its tasks in the project before the membership
    /// row goes, so no task is ever left assigned to a non-member.
    pub async fn remove_member(
        &self,
        project_id: &str,
        requester: &str,
        target: &str,
    ) -> Result<MemberRemoval, ServiceError> {
        let owner = self
            .store
            .project_owner(project_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("project", project_id))?;
        self.verify_membership(project_id, requester).await?;

        if !self.store.is_project_member(project_id, target).await? {
            return Err(Denial::TargetNotMember {
                project_id: project_id.to_string(),
                user_id: target.to_string(),
            }
            .into());
        }
        if target == owner {
            return Err(Denial::OwnerNotRemovable {
                project_id: project_id.to_string(),
            }
            .into());
        }
        if requester != target && requester != owner {
            return Err(Denial::NotOwner {
                project_id: project_id.to_string(),
                user_id: requester.to_string(),
            }
            .into());
        }

        let unassigned_tasks = self.store.unassign_user_in_project(project_id, target).await?;
        self.store.delete_project_user(project_id, target).await?;
        self.store.touch_project(project_id).await?;

        tracing::debug!(
            project_id,
            requester,
            target,
            unassigned = unassigned_tasks.len(),
            "member removed"
        );
        Ok(MemberRemoval {
            project_id: project_id.to_string(),
            removed_user: target.to_string(),
            unassigned_tasks,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_support::test_db;
    use crate::{Access, CrewDb};

    /// Project owned by `a` with members `a` and `b`; `c` exists but is outside.
    async fn seeded(db: &CrewDb) -> (TxStore, String) {
        let tx = db.begin(Access::Write).await.unwrap();
        for (id, name) in [("a", "A"), ("b", "B"), ("c", "C")] {
            tx.upsert_user(id, name).await.unwrap();
        }
        let project = tx.insert_project("Launch", None, "a").await.unwrap();
        tx.insert_project_user(&project, "b").await.unwrap();
        (tx, project)
    }

    fn is_denied(result: &Result<(), ServiceError>) -> bool {
        matches!(result, Err(ServiceError::Denied(_)))
    }

    #[tokio::test]
    async fn ownership_and_membership() {
        let (_dir, db) = test_db().await;
        let (tx, project) = seeded(&db).await;
        let authz = Authorizer::new(&tx);

        assert!(authz.verify_ownership(&project, "a").await.is_ok());
        assert!(is_denied(&authz.verify_ownership(&project, "b").await));
        assert!(authz.verify_membership(&project, "b").await.is_ok());
        assert!(is_denied(&authz.verify_membership(&project, "c").await));
        assert!(matches!(
            authz.verify_ownership("prj-missing0", "a").await,
            Err(ServiceError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn assignment_required_tracks_member_count() {
        let (_dir, db) = test_db().await;
        let tx = db.begin(Access::Write).await.unwrap();
        tx.upsert_user("a", "A").await.unwrap();
        tx.upsert_user("b", "B").await.unwrap();
        let project = tx.insert_project("Solo", None, "a").await.unwrap();
        let authz = Authorizer::new(&tx);

        assert!(!authz.assignment_required(&project).await.unwrap());
        tx.insert_project_user(&project, "b").await.unwrap();
        assert!(authz.assignment_required(&project).await.unwrap());
    }

    #[tokio::test]
    async fn solo_member_progresses_unassigned_tasks() {
        let (_dir, db) = test_db().await;
        let tx = db.begin(Access::Write).await.unwrap();
        tx.upsert_user("a", "A").await.unwrap();
        let project = tx.insert_project("Solo", None, "a").await.unwrap();
        let task = tx.insert_task(&project, "t", None, 5).await.unwrap();
        let authz = Authorizer::new(&tx);
        assert!(authz.verify_can_progress(&task, "a").await.is_ok());
    }

    #[tokio::test]
    async fn shared_project_requires_assignee_to_progress() {
        let (_dir, db) = test_db().await;
        let (tx, project) = seeded(&db).await;
        let mut task = tx.insert_task(&project, "t", None, 5).await.unwrap();
        let authz = Authorizer::new(&tx);

        assert!(is_denied(&authz.verify_can_progress(&task, "a").await));
        task.assigned_user = Some("b".into());
        assert!(authz.verify_can_progress(&task, "b").await.is_ok());
        assert!(is_denied(&authz.verify_can_progress(&task, "a").await));
        assert!(is_denied(&authz.verify_can_progress(&task, "c").await));
    }

    #[tokio::test]
    async fn unassign_by_assignee_or_owner() {
        let (_dir, db) = test_db().await;
        let (tx, project) = seeded(&db).await;
        tx.upsert_user("d", "D").await.unwrap();
        tx.insert_project_user(&project, "d").await.unwrap();
        let mut task = tx.insert_task(&project, "t", None, 5).await.unwrap();
        task.assigned_user = Some("b".into());
        let authz = Authorizer::new(&tx);

        assert!(authz.verify_can_unassign(&task, "b").await.is_ok());
        assert!(authz.verify_can_unassign(&task, "a").await.is_ok());
        assert!(matches!(
            authz.verify_can_unassign(&task, "d").await,
            Err(ServiceError::Denied(Denial::CannotUnassign { .. }))
        ));
    }

    #[tokio::test]
    async fn owner_can_never_be_removed() {
        let (_dir, db) = test_db().await;
        let (tx, project) = seeded(&db).await;
        let authz = Authorizer::new(&tx);

        for requester in ["a", "b"] {
            let result = authz.remove_member(&project, requester, "a").await;
            assert!(
                matches!(result, Err(ServiceError::Denied(Denial::OwnerNotRemovable { .. }))),
                "requester {requester}: {result:?}"
            );
        }
        assert_eq!(tx.project_users(&project).await.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn non_owner_cannot_remove_others() {
        let (_dir, db) = test_db().await;
        let (tx, project) = seeded(&db).await;
        tx.insert_project_user(&project, "c").await.unwrap();
        let authz = Authorizer::new(&tx);

        let result = authz.remove_member(&project, "b", "c").await;
        assert!(matches!(result, Err(ServiceError::Denied(Denial::NotOwner { .. }))));
        assert!(tx.is_project_member(&project, "c").await.unwrap());
    }

    #[tokio::test]
    async fn outsider_cannot_remove_anyone() {
        let (_dir, db) = test_db().await;
        let (tx, project) = seeded(&db).await;
        let authz = Authorizer::new(&tx);
        let result = authz.remove_member(&project, "c", "b").await;
        assert!(matches!(result, Err(ServiceError::Denied(Denial::NotMember { .. }))));
    }

    #[tokio::test]
    async fn removal_unassigns_every_task_of_the_target() {
        let (_dir, db) = test_db().await;
        let (tx, project) = seeded(&db).await;
        let mut assigned = Vec::new();
        for n in 0..3 {
            let task = tx.insert_task(&project, &format!("t{n}"), None, 1).await.unwrap();
            tx.set_task_assignee(&task.id, Some("b")).await.unwrap();
            assigned.push(task.id);
        }
        assigned.sort();
        let authz = Authorizer::new(&tx);

        let removal = authz.remove_member(&project, "a", "b").await.unwrap();
        assert_eq!(removal.removed_user, "b");
        assert_eq!(removal.unassigned_tasks, assigned);
        assert!(!tx.is_project_member(&project, "b").await.unwrap());
        for task in tx.list_tasks(&project).await.unwrap() {
            assert_eq!(task.assigned_user, None);
        }
    }

    #[tokio::test]
    async fn member_can_remove_self() {
        let (_dir, db) = test_db().await;
        let (tx, project) = seeded(&db).await;
        let authz = Authorizer::new(&tx);
        authz.remove_member(&project, "b", "b").await.unwrap();
        assert_eq!(tx.project_users(&project).await.unwrap(), vec!["a"]);
    }
}
