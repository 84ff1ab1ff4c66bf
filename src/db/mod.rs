/// Database layer
///
/// Manages the SQLite connection pool and typed access to upload
/// metadata. Queries are built at runtime so no database is needed at
/// compile time.
pub mod uploads;

use crate::error::{ApiError, ApiResult};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;

/// Database connection options
#[derive(Debug, Clone)]
pub struct DatabaseOptions {
    pub max_connections: u32,
    pub enable_wal: bool,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            max_connections: 10,
            enable_wal: true,
        }
    }
}

/// Create a SQLite connection pool
pub async fn create_pool(path: &Path, options: DatabaseOptions) -> ApiResult<SqlitePool> {
    let in_memory = path.to_str() == Some(":memory:");

    if !in_memory {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let connect = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(if options.enable_wal && !in_memory {
            sqlx::sqlite::SqliteJournalMode::Wal
        } else {
            sqlx::sqlite::SqliteJournalMode::Memory
        })
        .foreign_keys(true)
        .busy_timeout(std::time::Duration::from_secs(5));

    // An in-memory database lives and dies with its connection, so the
    // pool must pin exactly one.
    let max_connections = if in_memory { 1 } else { options.max_connections };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .min_connections(1)
        .connect_with(connect)
        .await
        .map_err(ApiError::from)?;

    Ok(pool)
}

/// Run embedded migrations
pub async fn run_migrations(pool: &SqlitePool) -> ApiResult<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| ApiError::Internal(format!("Migration failed: {}", e)))?;

    Ok(())
}

/// Test database connection
pub async fn test_connection(pool: &SqlitePool) -> ApiResult<()> {
    sqlx::query("SELECT 1").execute(pool).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[tokio::test]
    async fn test_in_memory_pool_roundtrip() {
        let pool = create_pool(Path::new(":memory:"), DatabaseOptions::default())
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();
        test_connection(&pool).await.unwrap();
    }
}
