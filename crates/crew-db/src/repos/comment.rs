//! Comment repository.

use chrono::Utc;
use crew_core::entities::Comment;
use crew_core::ids::PREFIX_COMMENT;

use crate::TxStore;
use crate::error::DatabaseError;
use crate::helpers::parse_datetime;

const SELECT_COLS: &str = "id, task_id, author, body, created_at";

fn row_to_comment(row: &libsql::Row) -> Result<Comment, DatabaseError> {
    Ok(Comment {
        id: row.get(0)?,
        task_id: row.get(1)?,
        author: row.get(2)?,
        body: row.get(3)?,
        created_at: parse_datetime(&row.get::<String>(4)?)?,
    })
}

impl TxStore {
    pub async fn insert_comment(
        &self,
        task_id: &str,
        author: &str,
        body: &str,
    ) -> Result<Comment, DatabaseError> {
        let now = Utc::now();
        let id = self.generate_id(PREFIX_COMMENT).await?;
        self.conn()
            .execute(
                &format!("INSERT INTO comments ({SELECT_COLS}) VALUES (?1, ?2, ?3, ?4, ?5)"),
                libsql::params![id.as_str(), task_id, author, body, now.to_rfc3339()],
            )
            .await?;
        Ok(Comment {
            id,
            task_id: task_id.to_string(),
            author: author.to_string(),
            body: body.to_string(),
            created_at: now,
        })
    }

    pub async fn get_comment(&self, id: &str) -> Result<Option<Comment>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(&format!("SELECT {SELECT_COLS} FROM comments WHERE id = ?1"), [id])
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_comment(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn list_comments(&self, task_id: &str) -> Result<Vec<Comment>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM comments WHERE task_id = ?1 ORDER BY created_at, rowid"),
                [task_id],
            )
            .await?;
        let mut comments = Vec::new();
        while let Some(row) = rows.next().await? {
            comments.push(row_to_comment(&row)?);
        }
        Ok(comments)
    }

    pub async fn delete_comment(&self, id: &str) -> Result<bool, DatabaseError> {
        let deleted = self
            .conn()
            .execute("DELETE FROM comments WHERE id = ?1", [id])
            .await?;
        Ok(deleted > 0)
    }
}
