//! Create the declared tables and indexes. Safe to run repeatedly.

use project_api::db::migration_connection;
use project_api::models::ENTITIES;
use project_api::{apply_schema, logging, Settings};
use sqlx::Connection;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;
    let _log_guard = logging::init(&settings.logging, settings.environment)?;

    let mut conn = migration_connection(&settings.database).await?;
    let result = apply_schema(&mut conn, ENTITIES).await;
    if let Err(e) = conn.close().await {
        tracing::warn!(error = %e, "closing migration connection failed");
    }
    result?;
    tracing::info!(tables = ENTITIES.len(), "migration complete");
    Ok(())
}
