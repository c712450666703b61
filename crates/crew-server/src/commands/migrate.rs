use anyhow::Context;
use crew_config::CrewConfig;
use crew_db::CrewDb;

/// Handle `crewd migrate`. Opening the database applies pending migrations.
pub async fn handle(config: &CrewConfig) -> anyhow::Result<()> {
    CrewDb::open(&config.database.path, config.database.busy_timeout_ms)
        .await
        .with_context(|| format!("failed to migrate database at {}", config.database.path))?;
    tracing::info!(path = %config.database.path, "database is up to date");
    Ok(())
}
