// =============================================================================
// Relational store bootstrap.
// =============================================================================

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::AppConfig;

pub async fn connect(cfg: &AppConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(cfg.db_max_connections)
        .min_connections(1)
        .connect(&cfg.database_url)
        .await
}

#[tracing::instrument(skip_all)]
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::migrate!().run(pool).await?;
    Ok(())
}
