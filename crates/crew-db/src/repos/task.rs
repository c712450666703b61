//! Task repository: CRUD, progress, and assignment.

use chrono::Utc;
use crew_core::entities::Task;
use crew_core::ids::PREFIX_TASK;

use crate::TxStore;
use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime};
use crate::updates::task::TaskUpdate;

const SELECT_COLS: &str = "id, project_id, title, description, points, max_points, assigned_user, created_at, updated_at";

fn row_to_task(row: &libsql::Row) -> Result<Task, DatabaseError> {
    Ok(Task {
        id: row.get(0)?,
        project_id: row.get(1)?,
        title: row.get(2)?,
        description: get_opt_string(row, 3)?,
        points: row.get(4)?,
        max_points: row.get(5)?,
        assigned_user: get_opt_string(row, 6)?,
        created_at: parse_datetime(&row.get::<String>(7)?)?,
        updated_at: parse_datetime(&row.get::<String>(8)?)?,
    })
}

impl TxStore {
    pub async fn insert_task(
        &self,
        project_id: &str,
        title: &str,
        description: Option<&str>,
        max_points: i64,
    ) -> Result<Task, DatabaseError> {
        let now = Utc::now();
        let id = self.generate_id(PREFIX_TASK).await?;

        self.conn()
            .execute(
                &format!(
                    "INSERT INTO tasks ({SELECT_COLS})
                     VALUES (?1, ?2, ?3, ?4, 0, ?5, NULL, ?6, ?6)"
                ),
                libsql::params![
                    id.as_str(),
                    project_id,
                    title,
                    description,
                    max_points,
                    now.to_rfc3339()
                ],
            )
            .await?;

        Ok(Task {
            id,
            project_id: project_id.to_string(),
            title: title.to_string(),
            description: description.map(String::from),
            points: 0,
            max_points,
            assigned_user: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn get_task(&self, id: &str) -> Result<Option<Task>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(&format!("SELECT {SELECT_COLS} FROM tasks WHERE id = ?1"), [id])
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_task(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn list_tasks(&self, project_id: &str) -> Result<Vec<Task>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM tasks WHERE project_id = ?1 ORDER BY created_at, id"
                ),
                [project_id],
            )
            .await?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next().await? {
            tasks.push(row_to_task(&row)?);
        }
        Ok(tasks)
    }

    /// Apply the `Some` fields of `update`, clamping `points` to a lowered
    /// `max_points`. Returns whether a row changed.
    pub async fn update_task(&self, task_id: &str, update: &TaskUpdate) -> Result<bool, DatabaseError> {
        let mut sets = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();
        let mut idx = 1usize;

        if let Some(ref title) = update.title {
            sets.push(format!("title = ?{idx}"));
            params.push(title.clone().into());
            idx += 1;
        }
        if let Some(ref description) = update.description {
            sets.push(format!("description = ?{idx}"));
            params.push(description.clone().map_or(libsql::Value::Null, Into::into));
            idx += 1;
        }
        if let Some(max_points) = update.max_points {
            // SET expressions see the pre-update row, so both columns read the old points.
            sets.push(format!("max_points = ?{idx}, points = MIN(points, ?{idx})"));
            params.push(max_points.into());
            idx += 1;
        }

        if sets.is_empty() {
            return Ok(false);
        }

        sets.push(format!("updated_at = ?{idx}"));
        params.push(Utc::now().to_rfc3339().into());
        idx += 1;

        params.push(task_id.into());
        let sql = format!("UPDATE tasks SET {} WHERE id = ?{idx}", sets.join(", "));
        let changed = self
            .conn()
            .execute(&sql, libsql::params_from_iter(params))
            .await?;
        Ok(changed > 0)
    }

    pub async fn set_task_points(&self, task_id: &str, points: i64) -> Result<bool, DatabaseError> {
        let changed = self
            .conn()
            .execute(
                "UPDATE tasks SET points = ?1, updated_at = ?2 WHERE id = ?3",
                libsql::params![points, Utc::now().to_rfc3339(), task_id],
            )
            .await?;
        Ok(changed > 0)
    }

    pub async fn set_task_assignee(
        &self,
        task_id: &str,
        assignee: Option<&str>,
    ) -> Result<bool, DatabaseError> {
        let changed = self
            .conn()
            .execute(
                "UPDATE tasks SET assigned_user = ?1, updated_at = ?2 WHERE id = ?3",
                libsql::params![assignee, Utc::now().to_rfc3339(), task_id],
            )
            .await?;
        Ok(changed > 0)
    }

    /// Clear `user_id` from every task in the project. Returns the affected task ids.
    pub async fn unassign_user_in_project(
        &self,
        project_id: &str,
        user_id: &str,
    ) -> Result<Vec<String>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "UPDATE tasks SET assigned_user = NULL, updated_at = ?1
                 WHERE project_id = ?2 AND assigned_user = ?3
                 RETURNING id",
                libsql::params![Utc::now().to_rfc3339(), project_id, user_id],
            )
            .await?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next().await? {
            ids.push(row.get::<String>(0)?);
        }
        ids.sort();
        Ok(ids)
    }

    /// Delete a task. Comments cascade.
    pub async fn delete_task(&self, task_id: &str) -> Result<bool, DatabaseError> {
        let deleted = self
            .conn()
            .execute("DELETE FROM tasks WHERE id = ?1", [task_id])
            .await?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::test_support::test_db;
    use crate::updates::task::TaskUpdateBuilder;
    use crate::{Access, CrewDb, TxStore};

    async fn seeded(db: &CrewDb) -> (TxStore, String) {
        let tx = db.begin(Access::Write).await.unwrap();
        tx.upsert_user("a", "A").await.unwrap();
        tx.upsert_user("b", "B").await.unwrap();
        let project = tx.insert_project("Launch", None, "a").await.unwrap();
        tx.insert_project_user(&project, "b").await.unwrap();
        (tx, project)
    }

    #[tokio::test]
    async fn insert_and_get() {
        let (_dir, db) = test_db().await;
        let (tx, project) = seeded(&db).await;
        let task = tx.insert_task(&project, "Write docs", Some("all of them"), 10).await.unwrap();
        let loaded = tx.get_task(&task.id).await.unwrap().unwrap();
        assert_eq!(loaded.title, "Write docs");
        assert_eq!(loaded.points, 0);
        assert_eq!(loaded.max_points, 10);
        assert_eq!(loaded.assigned_user, None);
    }

    #[tokio::test]
    async fn lowering_max_points_clamps_points() {
        let (_dir, db) = test_db().await;
        let (tx, project) = seeded(&db).await;
        let task = tx.insert_task(&project, "t", None, 10).await.unwrap();
        tx.set_task_points(&task.id, 8).await.unwrap();

        let update = TaskUpdateBuilder::new().max_points(5).build();
        tx.update_task(&task.id, &update).await.unwrap();
        let loaded = tx.get_task(&task.id).await.unwrap().unwrap();
        assert_eq!((loaded.points, loaded.max_points), (5, 5));

        let update = TaskUpdateBuilder::new().max_points(20).build();
        tx.update_task(&task.id, &update).await.unwrap();
        let loaded = tx.get_task(&task.id).await.unwrap().unwrap();
        assert_eq!((loaded.points, loaded.max_points), (5, 20));
    }

    #[tokio::test]
    async fn points_above_max_rejected_by_schema() {
        let (_dir, db) = test_db().await;
        let (tx, project) = seeded(&db).await;
        let task = tx.insert_task(&project, "t", None, 3).await.unwrap();
        assert!(tx.set_task_points(&task.id, 4).await.is_err());
    }

    #[tokio::test]
    async fn unassign_user_in_project_clears_only_that_user() {
        let (_dir, db) = test_db().await;
        let (tx, project) = seeded(&db).await;
        let t1 = tx.insert_task(&project, "t1", None, 1).await.unwrap();
        let t2 = tx.insert_task(&project, "t2", None, 1).await.unwrap();
        let t3 = tx.insert_task(&project, "t3", None, 1).await.unwrap();
        tx.set_task_assignee(&t1.id, Some("b")).await.unwrap();
        tx.set_task_assignee(&t2.id, Some("b")).await.unwrap();
        tx.set_task_assignee(&t3.id, Some("a")).await.unwrap();

        let mut expected = vec![t1.id.clone(), t2.id.clone()];
        expected.sort();
        assert_eq!(tx.unassign_user_in_project(&project, "b").await.unwrap(), expected);

        let tasks = tx.list_tasks(&project).await.unwrap();
        let assignees: Vec<_> = tasks.iter().map(|t| t.assigned_user.as_deref()).collect();
        assert_eq!(assignees, vec![None, None, Some("a")]);
    }
}
