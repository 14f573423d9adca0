// SQLite Connection Pool Setup

use offline_queue_core::error::{AppError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

/// Max pooled connections; queue writes are serialized upstream so a few suffice
const MAX_CONNECTIONS: u32 = 4;

/// Create SQLite connection pool with WAL mode
///
/// `database_url` may be a plain file path, a `sqlite:` URL or `:memory:`.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| AppError::Config(format!("Invalid database URL {database_url}: {e}")))?
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await
        .map_err(|e| AppError::Storage(format!("Failed to open {database_url}: {e}")))?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_pool() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        assert!(pool.acquire().await.is_ok());
    }

    #[tokio::test]
    async fn test_create_pool_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.db");

        let pool = create_pool(path.to_str().unwrap()).await.unwrap();
        assert!(pool.acquire().await.is_ok());
        assert!(path.exists());
    }
}
