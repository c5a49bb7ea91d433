//! Bazaar persistence layer.
//!
//! Postgres connection pooling, embedded migrations, row models, and the
//! zero-sized `*Repo` structs that hold every SQL statement.

use sqlx::postgres::PgPoolOptions;

pub mod models;
pub mod repositories;

pub type DbPool = sqlx::PgPool;

/// Default page size for list endpoints.
pub const DEFAULT_LIMIT: i64 = 20;

/// Maximum page size for list endpoints.
pub const MAX_LIMIT: i64 = 100;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await?;
    tracing::debug!(max_connections = 20, "Database pool created");
    Ok(pool)
}

/// Round-trip a trivial query to confirm the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await?;
    Ok(())
}

/// Apply all pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    let migrator = sqlx::migrate!("../../db/migrations");
    migrator.run(pool).await?;
    tracing::info!(count = migrator.iter().count(), "Migrations applied");
    Ok(())
}

/// Clamp a requested page size into `1..=MAX_LIMIT`, defaulting to [`DEFAULT_LIMIT`].
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// Clamp a requested offset to be non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}
