//! User repository.

use chrono::Utc;
use crew_core::entities::User;

use crate::TxStore;
use crate::error::DatabaseError;
use crate::helpers::parse_datetime;

fn row_to_user(row: &libsql::Row) -> Result<User, DatabaseError> {
    Ok(User {
        id: row.get(0)?,
        display_name: row.get(1)?,
        created_at: parse_datetime(&row.get::<String>(2)?)?,
    })
}

impl TxStore {
    /// Insert the user or refresh its display name. `created_at` is kept.
    pub async fn upsert_user(&self, id: &str, display_name: &str) -> Result<User, DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO users (id, display_name, created_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET display_name = ?2",
                libsql::params![id, display_name, Utc::now().to_rfc3339()],
            )
            .await?;
        self.get_user(id).await?.ok_or(DatabaseError::NoResult)
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<User>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT id, display_name, created_at FROM users WHERE id = ?1",
                [id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_user(&row)?)),
            None => Ok(None),
        }
    }
}
