//! Database connection and store error types.
//!
//! Both postgres-backed stores share one pool; migrations run once at
//! connection time.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use thiserror::Error;

/// Errors that can occur when interacting with the storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database connection failed
    #[error("Database connection error: {0}")]
    Connection(String),

    /// Migration execution failed
    #[error("Migration error: {0}")]
    Migration(String),

    /// SQL query execution failed
    #[error("Query error: {0}")]
    Query(String),

    /// Stored data did not parse back into its domain type
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        Self::Query(e.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        Self::Migration(e.to_string())
    }
}

/// Connect to the database and apply migrations.
pub async fn connect(
    database_url: &str,
    max_connections: u32,
    min_connections: u32,
) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(min_connections)
        .connect(database_url)
        .await
        .map_err(|e| StoreError::Connection(e.to_string()))?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    tracing::info!("Database connected and migrations applied");

    Ok(pool)
}
