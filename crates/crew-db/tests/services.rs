//! Service-layer flows across several requests, each in its own transaction.

use chrono::{TimeDelta, Utc};
use crew_core::identity::VerifiedIdentity;
use crew_core::limits::Limits;
use crew_db::error::{Denial, ServiceError};
use crew_db::services::{CommentService, ProjectService, Scope, TaskService, UserService};
use crew_db::updates::project::ProjectUpdateBuilder;
use crew_db::updates::task::TaskUpdateBuilder;
use crew_db::{Access, CrewDb, TxStore};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

async fn open() -> (TempDir, CrewDb) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("crew.db");
    let db = CrewDb::open(path.to_str().unwrap(), 5000).await.unwrap();
    (dir, db)
}

fn identity(user: &str) -> VerifiedIdentity {
    VerifiedIdentity {
        user_id: user.to_string(),
        display_name: user.to_uppercase(),
        valid_until: Utc::now() + TimeDelta::hours(1),
    }
}

/// Run `users` through `ensure` so they exist for membership operations.
async fn register(db: &CrewDb, users: &[&str]) {
    let limits = Limits::default();
    for user in users {
        let tx = db.begin(Access::Write).await.unwrap();
        let who = identity(user);
        UserService::new(Scope::new(&tx, &who, &limits)).ensure().await.unwrap();
        tx.commit().await.unwrap();
    }
}

struct Request {
    tx: TxStore,
    who: VerifiedIdentity,
    limits: Limits,
}

impl Request {
    async fn new(db: &CrewDb, user: &str) -> Self {
        Self {
            tx: db.begin(Access::Write).await.unwrap(),
            who: identity(user),
            limits: Limits::default(),
        }
    }

    fn scope(&self) -> Scope<'_> {
        Scope::new(&self.tx, &self.who, &self.limits)
    }

    fn projects(&self) -> ProjectService<'_> {
        ProjectService::new(self.scope())
    }

    fn tasks(&self) -> TaskService<'_> {
        TaskService::new(self.scope())
    }

    fn comments(&self) -> CommentService<'_> {
        CommentService::new(self.scope())
    }

    async fn commit(self) {
        self.tx.commit().await.unwrap();
    }
}

#[tokio::test]
async fn create_makes_owner_a_member_and_adds_members() {
    let (_dir, db) = open().await;
    register(&db, &["alice", "bob"]).await;

    let req = Request::new(&db, "alice").await;
    let project = req
        .projects()
        .create("Launch", Some("Q3"), &["bob".into(), "alice".into()])
        .await
        .unwrap();
    assert_eq!(project.owner, "alice");
    assert_eq!(project.users, vec!["alice", "bob"]);
}

#[tokio::test]
async fn create_with_unknown_member_fails_and_writes_nothing_visible() {
    let (_dir, db) = open().await;
    register(&db, &["alice"]).await;

    let req = Request::new(&db, "alice").await;
    let err = req
        .projects()
        .create("Launch", None, &["ghost".into()])
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { entity: "user", .. }));
}

#[tokio::test]
async fn validation_limits_apply() {
    let (_dir, db) = open().await;
    register(&db, &["alice"]).await;
    let req = Request::new(&db, "alice").await;

    assert!(matches!(
        req.projects().create("   ", None, &[]).await,
        Err(ServiceError::Validation(_))
    ));
    let project = req.projects().create("Launch", None, &[]).await.unwrap();
    for bad in [0, 1001] {
        assert!(matches!(
            req.tasks().create(&project.id, "t", None, bad).await,
            Err(ServiceError::Validation(_))
        ));
    }
    let task = req.tasks().create(&project.id, "t", None, 10).await.unwrap().item;
    assert!(matches!(
        req.tasks().set_points(&task.id, 11).await,
        Err(ServiceError::Validation(_))
    ));
    assert!(matches!(
        req.comments().add(&task.id, "").await,
        Err(ServiceError::Validation(_))
    ));
}

#[tokio::test]
async fn only_owner_updates_and_deletes() {
    let (_dir, db) = open().await;
    register(&db, &["alice", "bob"]).await;

    let req = Request::new(&db, "alice").await;
    let project = req.projects().create("Launch", None, &["bob".into()]).await.unwrap();
    req.commit().await;

    let req = Request::new(&db, "bob").await;
    let rename = ProjectUpdateBuilder::new().name("Mine now").build();
    assert!(matches!(
        req.projects().update(&project.id, &rename).await,
        Err(ServiceError::Denied(Denial::NotOwner { .. }))
    ));
    assert!(matches!(
        req.projects().delete(&project.id).await,
        Err(ServiceError::Denied(Denial::NotOwner { .. }))
    ));
    drop(req);

    let req = Request::new(&db, "alice").await;
    let updated = req.projects().update(&project.id, &rename).await.unwrap();
    assert_eq!(updated.name, "Mine now");
    let deleted = req.projects().delete(&project.id).await.unwrap();
    assert_eq!(deleted.users, vec!["alice", "bob"]);
    assert!(matches!(
        req.projects().get(&project.id).await,
        Err(ServiceError::NotFound { .. })
    ));
}

#[tokio::test]
async fn outsiders_see_nothing() {
    let (_dir, db) = open().await;
    register(&db, &["alice", "mallory"]).await;

    let req = Request::new(&db, "alice").await;
    let project = req.projects().create("Launch", None, &[]).await.unwrap();
    let task = req.tasks().create(&project.id, "t", None, 5).await.unwrap().item;
    req.commit().await;

    let req = Request::new(&db, "mallory").await;
    assert!(req.projects().list_for_user().await.unwrap().is_empty());
    assert!(matches!(
        req.projects().get(&project.id).await,
        Err(ServiceError::Denied(Denial::NotMember { .. }))
    ));
    assert!(matches!(
        req.tasks().get(&task.id).await,
        Err(ServiceError::Denied(Denial::NotMember { .. }))
    ));
    assert!(matches!(
        req.comments().add(&task.id, "hi").await,
        Err(ServiceError::Denied(Denial::NotMember { .. }))
    ));
}

#[tokio::test]
async fn progress_rules_follow_member_count() {
    let (_dir, db) = open().await;
    register(&db, &["alice", "bob"]).await;

    let req = Request::new(&db, "alice").await;
    let project = req.projects().create("Solo", None, &[]).await.unwrap();
    let task = req.tasks().create(&project.id, "t", None, 10).await.unwrap().item;

    // Alone: unassigned progress is fine.
    assert_eq!(req.tasks().set_points(&task.id, 3).await.unwrap().item.points, 3);

    // Two members: only the assignee may progress.
    req.projects().add_member(&project.id, "bob").await.unwrap();
    assert!(matches!(
        req.tasks().set_points(&task.id, 4).await,
        Err(ServiceError::Denied(Denial::NotAssigned { .. }))
    ));
    req.tasks().assign_self(&task.id).await.unwrap();
    let change = req.tasks().set_points(&task.id, 4).await.unwrap();
    assert_eq!(change.item.points, 4);
    assert_eq!(change.members, vec!["alice", "bob"]);
}

#[tokio::test]
async fn assignment_is_exclusive_and_owner_can_unassign() {
    let (_dir, db) = open().await;
    register(&db, &["alice", "bob", "carol"]).await;

    let req = Request::new(&db, "alice").await;
    let project = req
        .projects()
        .create("Launch", None, &["bob".into(), "carol".into()])
        .await
        .unwrap();
    let task = req.tasks().create(&project.id, "t", None, 10).await.unwrap().item;
    req.commit().await;

    let req = Request::new(&db, "bob").await;
    let taken = req.tasks().assign_self(&task.id).await.unwrap();
    assert_eq!(taken.item.assigned_user.as_deref(), Some("bob"));
    req.commit().await;

    let req = Request::new(&db, "carol").await;
    assert!(matches!(
        req.tasks().assign_self(&task.id).await,
        Err(ServiceError::Denied(Denial::AlreadyAssigned { .. }))
    ));
    assert!(matches!(
        req.tasks().unassign(&task.id).await,
        Err(ServiceError::Denied(Denial::CannotUnassign { .. }))
    ));
    drop(req);

    let req = Request::new(&db, "alice").await;
    let released = req.tasks().unassign(&task.id).await.unwrap();
    assert_eq!(released.item.assigned_user, None);
}

#[tokio::test]
async fn lowering_ceiling_clamps_progress() {
    let (_dir, db) = open().await;
    register(&db, &["alice"]).await;
    let req = Request::new(&db, "alice").await;
    let project = req.projects().create("Solo", None, &[]).await.unwrap();
    let task = req.tasks().create(&project.id, "t", None, 10).await.unwrap().item;
    req.tasks().set_points(&task.id, 9).await.unwrap();

    let update = TaskUpdateBuilder::new().max_points(4).title("renamed").build();
    let change = req.tasks().update(&task.id, &update).await.unwrap();
    assert_eq!(change.item.title, "renamed");
    assert_eq!((change.item.points, change.item.max_points), (4, 4));
}

#[tokio::test]
async fn removing_member_unassigns_their_tasks_atomically() {
    let (_dir, db) = open().await;
    register(&db, &["alice", "bob"]).await;

    let req = Request::new(&db, "alice").await;
    let project = req.projects().create("Launch", None, &["bob".into()]).await.unwrap();
    let mut tasks = Vec::new();
    for n in 0..3 {
        tasks.push(req.tasks().create(&project.id, &format!("t{n}"), None, 5).await.unwrap().item);
    }
    req.commit().await;

    let req = Request::new(&db, "bob").await;
    for task in &tasks {
        req.tasks().assign_self(&task.id).await.unwrap();
    }
    req.commit().await;

    // Rolled back removal leaves everything in place.
    let req = Request::new(&db, "alice").await;
    req.projects().remove_member(&project.id, "bob").await.unwrap();
    req.tx.rollback().await.unwrap();

    let req = Request::new(&db, "alice").await;
    for task in req.tasks().list(&project.id).await.unwrap() {
        assert_eq!(task.assigned_user.as_deref(), Some("bob"));
    }
    let removal = req.projects().remove_member(&project.id, "bob").await.unwrap();
    assert_eq!(removal.removed_user, "bob");
    assert_eq!(removal.unassigned_tasks.len(), 3);
    assert_eq!(removal.project.users, vec!["alice"]);
    req.commit().await;

    let req = Request::new(&db, "alice").await;
    for task in req.tasks().list(&project.id).await.unwrap() {
        assert_eq!(task.assigned_user, None);
    }
}

#[tokio::test]
async fn owner_cannot_leave() {
    let (_dir, db) = open().await;
    register(&db, &["alice", "bob"]).await;
    let req = Request::new(&db, "alice").await;
    let project = req.projects().create("Launch", None, &["bob".into()]).await.unwrap();

    assert!(matches!(
        req.projects().leave(&project.id).await,
        Err(ServiceError::Denied(Denial::OwnerNotRemovable { .. }))
    ));
    assert!(matches!(
        req.projects().remove_member(&project.id, "alice").await,
        Err(ServiceError::Denied(Denial::OwnerNotRemovable { .. }))
    ));
}

#[tokio::test]
async fn comment_deletion_by_author_or_owner() {
    let (_dir, db) = open().await;
    register(&db, &["alice", "bob", "carol"]).await;

    let req = Request::new(&db, "alice").await;
    let project = req
        .projects()
        .create("Launch", None, &["bob".into(), "carol".into()])
        .await
        .unwrap();
    let task = req.tasks().create(&project.id, "t", None, 5).await.unwrap().item;
    req.commit().await;

    let req = Request::new(&db, "bob").await;
    let first = req.comments().add(&task.id, "first").await.unwrap().item;
    let second = req.comments().add(&task.id, "second").await.unwrap().item;
    req.commit().await;

    let req = Request::new(&db, "carol").await;
    assert!(matches!(
        req.comments().delete(&first.id).await,
        Err(ServiceError::Denied(Denial::NotAuthor { .. }))
    ));
    drop(req);

    let req = Request::new(&db, "bob").await;
    req.comments().delete(&first.id).await.unwrap();
    req.commit().await;

    let req = Request::new(&db, "alice").await;
    let change = req.comments().delete(&second.id).await.unwrap();
    assert_eq!(change.members, vec!["alice", "bob", "carol"]);
    assert!(req.comments().list(&task.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn ensure_refreshes_display_name() {
    let (_dir, db) = open().await;
    let limits = Limits::default();
    let tx = db.begin(Access::Write).await.unwrap();
    let mut who = identity("alice");
    UserService::new(Scope::new(&tx, &who, &limits)).ensure().await.unwrap();
    who.display_name = "Alice Liddell".into();
    let user = UserService::new(Scope::new(&tx, &who, &limits)).ensure().await.unwrap();
    assert_eq!(user.display_name, "Alice Liddell");
    let me = UserService::new(Scope::new(&tx, &who, &limits)).me().await.unwrap();
    assert_eq!(me, user);
}

#[tokio::test]
async fn is_current_tracks_row_and_display_name() {
    let (_dir, db) = open().await;
    let limits = Limits::default();
    let mut who = identity("alice");

    let reader = db.begin(Access::Read).await.unwrap();
    let users = UserService::new(Scope::new(&reader, &who, &limits));
    assert!(!users.is_current().await.unwrap());
    reader.rollback().await.unwrap();

    register(&db, &["alice"]).await;
    let reader = db.begin(Access::Read).await.unwrap();
    assert!(UserService::new(Scope::new(&reader, &who, &limits)).is_current().await.unwrap());
    who.display_name = "Alice Liddell".into();
    assert!(!UserService::new(Scope::new(&reader, &who, &limits)).is_current().await.unwrap());
}
