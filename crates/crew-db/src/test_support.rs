//! Shared test utilities for crew-db unit tests.

use tempfile::TempDir;

use crate::CrewDb;

/// Open a fresh file-backed database in a temp dir. Keep the `TempDir` alive.
pub async fn test_db() -> (TempDir, CrewDb) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("crew.db");
    let db = CrewDb::open(path.to_str().unwrap(), 5000).await.unwrap();
    (dir, db)
}
