//! Postgres connection pool factory.
//!
//! The pool is created once at startup and handed to the record store; there
//! is no process-global session.

use std::time::Duration;

use anyhow::Context;
use bookshelf_kernel::settings::DatabaseSettings;
use sqlx::postgres::PgPoolOptions;

pub use sqlx::PgPool;

/// Pool options derived from settings, without connecting.
pub fn pool_options(settings: &DatabaseSettings) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_millis(settings.acquire_timeout_ms))
}

/// Connect to Postgres and verify the connection with a round trip.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<PgPool> {
    tracing::info!(
        target: "bookshelf-db",
        max_connections = settings.max_connections,
        "connecting to postgres"
    );

    let pool = pool_options(settings)
        .connect(&settings.url)
        .await
        .context("failed to connect to postgres")?;

    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .context("postgres connectivity check failed")?;

    Ok(pool)
}

/// Create a pool that connects on first use.
pub fn connect_lazy(settings: &DatabaseSettings) -> anyhow::Result<PgPool> {
    pool_options(settings)
        .connect_lazy(&settings.url)
        .context("invalid postgres connection url")
}
