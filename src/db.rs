//! Database connection pool and migration management.
//!
//! This module provides utilities for:
//! - Creating the PostgreSQL connection pool backing the credential store
//! - Running database migrations automatically

use std::time::Duration;

use sqlx::{Pool, Postgres};

/// Type alias for PostgreSQL connection pool.
pub type DbPool = Pool<Postgres>;

/// Create a new PostgreSQL connection pool.
///
/// # Configuration
///
/// - Maximum connections: 5
/// - Acquire timeout: 5 seconds, so a saturated or unreachable database
///   surfaces as `StoreUnavailable` instead of a hung request
///
/// # Errors
///
/// Returns an error if:
/// - Database connection string is invalid
/// - Cannot connect to PostgreSQL server
/// - Database authentication fails
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

/// Run database migrations from the `migrations/` directory.
///
/// Migrations are tracked in the `_sqlx_migrations` table, so each one runs only once.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    // The macro reads migrations at compile time from ./migrations directory
    sqlx::migrate!("./migrations").run(pool).await
}
