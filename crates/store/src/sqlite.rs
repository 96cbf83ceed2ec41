//! Durable key-value store backed by SQLite.
//!
//! Used by the web profile, where state must survive restarts. Rows live in a
//! single `kv_store` table inside `{app_data_dir}/fittrack/client.db`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;

use crate::error::{StoreError, StoreResult};
use crate::store::KeyValueStore;

/// SQLite-backed key-value store.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the store in the OS app data directory.
    pub async fn open_default() -> StoreResult<Self> {
        Self::open(&default_db_path()?).await
    }

    /// Open (creating if needed) the store at `path`.
    pub async fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;

        tracing::debug!(path = %path.display(), "opened sqlite store");
        Self::with_pool(pool).await
    }

    /// A private in-memory database. Contents vanish with the store.
    pub async fn in_memory() -> StoreResult<Self> {
        // One connection that never expires: each sqlite memory connection
        // is its own database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> StoreResult<Self> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key         TEXT PRIMARY KEY,
                value       TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let row = sqlx::query(
            r#"
            SELECT value
            FROM kv_store
            WHERE key = ?1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(row.try_get("value")?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key)
            DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_keys(&self) -> StoreResult<Vec<String>> {
        let rows = sqlx::query("SELECT key FROM kv_store ORDER BY key ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| row.try_get::<String, _>("key").map_err(StoreError::from))
            .collect()
    }

    async fn clear(&self) -> StoreResult<()> {
        sqlx::query("DELETE FROM kv_store")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Resolve `{app_data_dir}/fittrack/client.db`.
fn default_db_path() -> StoreResult<PathBuf> {
    let mut dir = dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut h| {
                h.push(".local");
                h.push("share");
                h
            })
        })
        .ok_or_else(|| {
            StoreError::Location("no data_dir() and no home_dir()/.local/share".to_string())
        })?;

    dir.push("fittrack");
    dir.push("client.db");
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_round_trip() {
        let store = SqliteStore::in_memory().await.unwrap();
        assert_eq!(store.get("token").await.unwrap(), None);

        store.set("token", "abc").await.unwrap();
        store.set("token", "def").await.unwrap();
        store.set("another", "1").await.unwrap();

        assert_eq!(store.get("token").await.unwrap().as_deref(), Some("def"));
        assert_eq!(store.list_keys().await.unwrap(), vec!["another", "token"]);

        store.remove("token").await.unwrap();
        assert_eq!(store.get("token").await.unwrap(), None);

        store.clear().await.unwrap();
        assert!(store.list_keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn values_survive_reopen() {
        let path = std::env::temp_dir()
            .join(format!("fittrack-store-{}", uuid::Uuid::now_v7()))
            .join("client.db");

        {
            let store = SqliteStore::open(&path).await.unwrap();
            store.set("auth_token", "persisted").await.unwrap();
            store.pool.close().await;
        }

        let reopened = SqliteStore::open(&path).await.unwrap();
        assert_eq!(
            reopened.get("auth_token").await.unwrap().as_deref(),
            Some("persisted")
        );
        reopened.pool.close().await;

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }
}
