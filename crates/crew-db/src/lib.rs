//! # crew-db
//!
//! libSQL persistence for Crew: users, projects, memberships, tasks, and
//! comments, plus the authorization engine and the service layer built on top.
//!
//! Every request works inside exactly one [`TxStore`], a libSQL transaction on
//! a connection of its own. Repository methods are `impl TxStore` blocks in
//! [`repos`], so everything a request reads sees its own uncommitted writes.
//! Nothing here is visible to other requests until the caller commits.

pub mod authz;
pub mod error;
pub mod helpers;
mod migrations;
pub mod repos;
pub mod services;
pub mod updates;

#[cfg(test)]
mod test_support;

use error::DatabaseError;
use libsql::{Builder, TransactionBehavior};

/// Whether a request intends to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// `BEGIN DEFERRED`.
    Read,
    /// `BEGIN IMMEDIATE`: take the write lock up front so concurrent writers
    /// queue on `busy_timeout` instead of failing mid-request.
    Write,
}

impl Access {
    const fn behavior(self) -> TransactionBehavior {
        match self {
            Self::Read => TransactionBehavior::Deferred,
            Self::Write => TransactionBehavior::Immediate,
        }
    }
}

/// Process-wide database handle. Hands out one connection per request.
///
/// The path must name a file: every [`CrewDb::begin`] opens a new connection,
/// and `:memory:` would give each connection its own empty database.
pub struct CrewDb {
    db: libsql::Database,
    busy_timeout_ms: u64,
}

impl CrewDb {
    /// Open (or create) the database at `path` and run migrations.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open(path: &str, busy_timeout_ms: u64) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        let crew_db = Self {
            db,
            busy_timeout_ms,
        };

        let conn = crew_db.connect().await?;
        // journal_mode is persistent in the file, so once per open is enough.
        let mut rows = conn
            .query("PRAGMA journal_mode = WAL", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA journal_mode: {e}")))?;
        rows.next().await?;
        migrations::run(&conn).await?;

        tracing::debug!(path, "database opened");
        Ok(crew_db)
    }

    /// Open a fresh connection with per-connection pragmas applied.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the connection or a pragma fails.
    pub async fn connect(&self) -> Result<libsql::Connection, DatabaseError> {
        let conn = self.db.connect()?;

        // Enable foreign keys (must be per-connection in SQLite)
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Query(format!("PRAGMA foreign_keys: {e}")))?;
        let mut rows = conn
            .query(&format!("PRAGMA busy_timeout = {}", self.busy_timeout_ms), ())
            .await
            .map_err(|e| DatabaseError::Query(format!("PRAGMA busy_timeout: {e}")))?;
        rows.next().await?;

        Ok(conn)
    }

    /// Start a request transaction on a new connection.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the connection cannot be opened or the
    /// transaction cannot begin (e.g. the write lock times out).
    pub async fn begin(&self, access: Access) -> Result<TxStore, DatabaseError> {
        let conn = self.connect().await?;
        let tx = conn.transaction_with_behavior(access.behavior()).await?;
        Ok(TxStore { tx })
    }
}

/// A request-scoped transaction. All repository methods live on this type.
///
/// Dropping a `TxStore` without committing rolls the transaction back.
pub struct TxStore {
    tx: libsql::Transaction,
}

impl TxStore {
    /// Access the underlying libSQL connection for direct queries.
    ///
    /// Statements run here are part of the request transaction.
    #[must_use]
    pub fn conn(&self) -> &libsql::Connection {
        &self.tx
    }

    /// Commit every write made through this store.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the commit fails. The transaction is then
    /// rolled back when the connection drops.
    pub async fn commit(self) -> Result<(), DatabaseError> {
        self.tx.commit().await?;
        Ok(())
    }

    /// Discard every write made through this store.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the rollback statement fails.
    pub async fn rollback(self) -> Result<(), DatabaseError> {
        self.tx.rollback().await?;
        Ok(())
    }

    /// Generate a prefixed ID via libSQL. Returns e.g., `"tsk-a3f8b2c1"`.
    ///
    /// Uses `randomblob(4)` in SQL to produce 8-char hex, then prepends the prefix.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or returns no rows.
    pub async fn generate_id(&self, prefix: &str) -> Result<String, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT '{prefix}-' || lower(hex(randomblob(4)))"),
                (),
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<String>(0)?)
    }
}
