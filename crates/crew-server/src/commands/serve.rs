use anyhow::Context;
use crew_auth::{SecretKey, TokenVerifier};
use crew_config::CrewConfig;
use crew_db::CrewDb;
use crew_server::{AppState, router};
use tokio::net::TcpListener;

/// Handle `crewd serve`.
pub async fn handle(config: CrewConfig) -> anyhow::Result<()> {
    if !config.auth.is_configured() {
        anyhow::bail!(
            "auth.secret_key is not set; run `crewd keygen` and set CREW_AUTH__SECRET_KEY"
        );
    }
    let key = SecretKey::from_bytes(&config.auth.secret_key_bytes()?)?;

    let db = CrewDb::open(&config.database.path, config.database.busy_timeout_ms)
        .await
        .with_context(|| format!("failed to open database at {}", config.database.path))?;

    let state = AppState::new(
        db,
        TokenVerifier::new(key),
        config.limits,
        config.server.connection_buffer,
    );

    let listener = TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_addr))?;
    tracing::info!(addr = %config.server.bind_addr, db = %config.database.path, "crewd listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("crewd stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
