use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Creates a PostgreSQL connection pool and applies pending migrations.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to apply database migrations")?;

    info!("Database migrations applied");
    Ok(pool)
}

/// Returns true when the given error is a Postgres unique violation on `constraint`.
pub fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    err.as_database_error()
        .map(|db| db.code().as_deref() == Some("23505") && db.constraint() == Some(constraint))
        .unwrap_or(false)
}

/// Returns true when Postgres aborted the transaction to keep it serializable (SQLSTATE 40001).
pub fn is_serialization_failure(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.code().as_deref() == Some("40001"))
        .unwrap_or(false)
}
