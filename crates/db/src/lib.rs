//! Postgres persistence for content versions and collection settings.

use sqlx::migrate::{MigrateError, Migrator};
use sqlx::postgres::PgPoolOptions;

pub mod ddl;
pub mod models;
pub mod repositories;

pub type DbPool = sqlx::PgPool;

/// Migrations embedded from `db/migrations` at the workspace root.
pub static MIGRATOR: Migrator = sqlx::migrate!("../../db/migrations");

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to verify the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Version of the newest successfully applied migration, if any.
pub async fn latest_migration(pool: &DbPool) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar("SELECT MAX(version) FROM _sqlx_migrations WHERE success")
        .fetch_one(pool)
        .await
}

/// Apply all pending migrations. Each migration runs in its own transaction.
pub async fn run_migrations(pool: &DbPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await?;
    tracing::debug!(count = MIGRATOR.iter().count(), "Migrations up to date");
    Ok(())
}
