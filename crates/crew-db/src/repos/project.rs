//! Project and membership repository.

use chrono::Utc;
use crew_core::entities::Project;
use crew_core::ids::PREFIX_PROJECT;

use crate::TxStore;
use crate::error::DatabaseError;
use crate::helpers::{collect_strings, get_opt_string, parse_datetime};
use crate::updates::project::ProjectUpdate;

const SELECT_COLS: &str = "id, name, description, owner, created_at, updated_at";

fn row_to_project(row: &libsql::Row, users: Vec<String>) -> Result<Project, DatabaseError> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        description: get_opt_string(row, 2)?,
        owner: row.get(3)?,
        users,
        created_at: parse_datetime(&row.get::<String>(4)?)?,
        updated_at: parse_datetime(&row.get::<String>(5)?)?,
    })
}

impl TxStore {
    /// Insert a project and make `owner` its first member.
    pub async fn insert_project(
        &self,
        name: &str,
        description: Option<&str>,
        owner: &str,
    ) -> Result<String, DatabaseError> {
        let now = Utc::now().to_rfc3339();
        let id = self.generate_id(PREFIX_PROJECT).await?;
        self.conn()
            .execute(
                &format!("INSERT INTO projects ({SELECT_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?5)"),
                libsql::params![id.as_str(), name, description, owner, now],
            )
            .await?;
        self.insert_project_user(&id, owner).await?;
        Ok(id)
    }

    pub async fn get_project(&self, id: &str) -> Result<Option<Project>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM projects WHERE id = ?1"),
                [id],
            )
            .await?;
        let Some(row) = rows.next().await? else {
            return Ok(None);
        };
        let users = self.project_users(id).await?;
        Ok(Some(row_to_project(&row, users)?))
    }

    /// Projects `user_id` is a member of, oldest first.
    pub async fn list_projects_for_user(&self, user_id: &str) -> Result<Vec<Project>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT p.id, p.name, p.description, p.owner, p.created_at, p.updated_at
                 FROM projects p JOIN project_users pu ON pu.project_id = p.id
                 WHERE pu.user_id = ?1
                 ORDER BY p.created_at, p.id",
                [user_id],
            )
            .await?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next().await? {
            let id = row.get::<String>(0)?;
            let users = self.project_users(&id).await?;
            projects.push(row_to_project(&row, users)?);
        }
        Ok(projects)
    }

    /// Apply the `Some` fields of `update`. Returns whether a row changed.
    pub async fn update_project(
        &self,
        project_id: &str,
        update: &ProjectUpdate,
    ) -> Result<bool, DatabaseError> {
        let mut sets = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();
        let mut idx = 1usize;

        if let Some(ref name) = update.name {
            sets.push(format!("name = ?{idx}"));
            params.push(name.clone().into());
            idx += 1;
        }
        if let Some(ref description) = update.description {
            sets.push(format!("description = ?{idx}"));
            params.push(description.clone().map_or(libsql::Value::Null, Into::into));
            idx += 1;
        }

        if sets.is_empty() {
            return Ok(false);
        }

        sets.push(format!("updated_at = ?{idx}"));
        params.push(Utc::now().to_rfc3339().into());
        idx += 1;

        params.push(project_id.into());
        let sql = format!("UPDATE projects SET {} WHERE id = ?{idx}", sets.join(", "));
        let changed = self
            .conn()
            .execute(&sql, libsql::params_from_iter(params))
            .await?;
        Ok(changed > 0)
    }

    pub async fn touch_project(&self, project_id: &str) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "UPDATE projects SET updated_at = ?1 WHERE id = ?2",
                libsql::params![Utc::now().to_rfc3339(), project_id],
            )
            .await?;
        Ok(())
    }

    /// Delete a project. Memberships, tasks, and comments cascade.
    pub async fn delete_project(&self, project_id: &str) -> Result<bool, DatabaseError> {
        let deleted = self
            .conn()
            .execute("DELETE FROM projects WHERE id = ?1", [project_id])
            .await?;
        Ok(deleted > 0)
    }

    /// Member ids in join order.
    pub async fn project_users(&self, project_id: &str) -> Result<Vec<String>, DatabaseError> {
        let rows = self
            .conn()
            .query(
                "SELECT user_id FROM project_users WHERE project_id = ?1 ORDER BY rowid",
                [project_id],
            )
            .await?;
        collect_strings(rows).await
    }

    pub async fn project_owner(&self, project_id: &str) -> Result<Option<String>, DatabaseError> {
        let mut rows = self
            .conn()
            .query("SELECT owner FROM projects WHERE id = ?1", [project_id])
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row.get::<String>(0)?)),
            None => Ok(None),
        }
    }

    pub async fn is_project_member(
        &self,
        project_id: &str,
        user_id: &str,
    ) -> Result<bool, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT 1 FROM project_users WHERE project_id = ?1 AND user_id = ?2",
                [project_id, user_id],
            )
            .await?;
        Ok(rows.next().await?.is_some())
    }

    pub async fn project_member_count(&self, project_id: &str) -> Result<u64, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT COUNT(*) FROM project_users WHERE project_id = ?1",
                [project_id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        let count = row.get::<i64>(0)?;
        u64::try_from(count).map_err(|_| DatabaseError::InvalidState(format!("negative count {count}")))
    }

    /// Add a membership. Returns `false` if the user was already a member.
    pub async fn insert_project_user(
        &self,
        project_id: &str,
        user_id: &str,
    ) -> Result<bool, DatabaseError> {
        let inserted = self
            .conn()
            .execute(
                "INSERT OR IGNORE INTO project_users (project_id, user_id, joined_at)
                 VALUES (?1, ?2, ?3)",
                libsql::params![project_id, user_id, Utc::now().to_rfc3339()],
            )
            .await?;
        Ok(inserted > 0)
    }

    pub async fn delete_project_user(
        &self,
        project_id: &str,
        user_id: &str,
    ) -> Result<bool, DatabaseError> {
        let deleted = self
            .conn()
            .execute(
                "DELETE FROM project_users WHERE project_id = ?1 AND user_id = ?2",
                [project_id, user_id],
            )
            .await?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::Access;
    use crate::test_support::test_db;
    use crate::updates::project::ProjectUpdateBuilder;

    #[tokio::test]
    async fn owner_is_first_member() {
        let (_dir, db) = test_db().await;
        let tx = db.begin(Access::Write).await.unwrap();
        tx.upsert_user("a", "A").await.unwrap();
        tx.upsert_user("b", "B").await.unwrap();
        let id = tx.insert_project("Launch", None, "a").await.unwrap();
        tx.insert_project_user(&id, "b").await.unwrap();

        let project = tx.get_project(&id).await.unwrap().unwrap();
        assert_eq!(project.owner, "a");
        assert_eq!(project.users, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn membership_insert_is_idempotent() {
        let (_dir, db) = test_db().await;
        let tx = db.begin(Access::Write).await.unwrap();
        tx.upsert_user("a", "A").await.unwrap();
        let id = tx.insert_project("Launch", None, "a").await.unwrap();
        assert!(!tx.insert_project_user(&id, "a").await.unwrap());
        assert_eq!(tx.project_member_count(&id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn update_only_touches_given_fields() {
        let (_dir, db) = test_db().await;
        let tx = db.begin(Access::Write).await.unwrap();
        tx.upsert_user("a", "A").await.unwrap();
        let id = tx.insert_project("Launch", Some("first"), "a").await.unwrap();

        let update = ProjectUpdateBuilder::new().name("Liftoff").build();
        assert!(tx.update_project(&id, &update).await.unwrap());
        let project = tx.get_project(&id).await.unwrap().unwrap();
        assert_eq!(project.name, "Liftoff");
        assert_eq!(project.description.as_deref(), Some("first"));

        let empty = ProjectUpdateBuilder::new().build();
        assert!(!tx.update_project(&id, &empty).await.unwrap());
    }

    #[tokio::test]
    async fn list_for_user_only_returns_memberships() {
        let (_dir, db) = test_db().await;
        let tx = db.begin(Access::Write).await.unwrap();
        tx.upsert_user("a", "A").await.unwrap();
        tx.upsert_user("b", "B").await.unwrap();
        let mine = tx.insert_project("Mine", None, "a").await.unwrap();
        tx.insert_project("Theirs", None, "b").await.unwrap();

        let listed = tx.list_projects_for_user("a").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, mine);
    }

    #[tokio::test]
    async fn delete_cascades_memberships() {
        let (_dir, db) = test_db().await;
        let tx = db.begin(Access::Write).await.unwrap();
        tx.upsert_user("a", "A").await.unwrap();
        let id = tx.insert_project("Launch", None, "a").await.unwrap();
        assert!(tx.delete_project(&id).await.unwrap());
        assert!(tx.project_users(&id).await.unwrap().is_empty());
        assert!(tx.get_project(&id).await.unwrap().is_none());
    }
}
