use std::str::FromStr;
use std::time::Duration;

use domains::{AppError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::ConnectOptions;

use crate::map_db;

/// Opens the database, creating the file when missing, and applies the
/// embedded migrations. Every statement is logged at DEBUG; statements
/// slower than `slow_query` are logged at WARN.
pub async fn connect(url: &str, slow_query: Duration) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)
        .map_err(map_db)?
        .create_if_missing(true)
        .foreign_keys(true)
        .log_statements(log::LevelFilter::Debug)
        .log_slow_statements(log::LevelFilter::Warn, slow_query);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .map_err(map_db)?;

    migrate(&pool).await?;
    tracing::info!(url, "database ready");
    Ok(pool)
}

/// A fresh, fully migrated in-memory database. Callers get an isolated
/// store per call; the pool is capped at one connection because each
/// SQLite `:memory:` connection is its own database.
pub async fn connect_memory() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .map_err(map_db)?
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .map_err(map_db)?;

    migrate(&pool).await?;
    Ok(pool)
}

async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!().run(pool).await.map_err(AppError::internal)
}
