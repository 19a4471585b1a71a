//! SQLite-backed credential store

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::api::session::{CredentialStore, TOKEN_KEY};

#[derive(Debug, Clone)]
pub struct SqliteCredentialStore {
    pool: SqlitePool,
}

impl SqliteCredentialStore {
    /// Open (creating if needed) the database at `path`
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open credential database: {}", path.display()))?;
        Self::with_pool(pool).await
    }

    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory database")?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS credentials (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await
        .context("Failed to create credentials table")?;
        Ok(Self { pool })
    }

    /// When the stored token was last written
    pub async fn token_updated_at(&self) -> Result<Option<DateTime<Utc>>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT updated_at FROM credentials WHERE key = ?")
                .bind(TOKEN_KEY)
                .fetch_optional(&self.pool)
                .await
                .context("Failed to read token timestamp")?;

        Ok(row.and_then(|(ts,)| {
            DateTime::parse_from_rfc3339(&ts)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        }))
    }
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn load_token(&self) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM credentials WHERE key = ?")
            .bind(TOKEN_KEY)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to read stored token")?;
        Ok(row.map(|(value,)| value))
    }

    async fn store_token(&self, token: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO credentials (key, value, updated_at)
             VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(TOKEN_KEY)
        .bind(token)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to store token")?;
        Ok(())
    }

    async fn clear_token(&self) -> Result<()> {
        sqlx::query("DELETE FROM credentials WHERE key = ?")
            .bind(TOKEN_KEY)
            .execute(&self.pool)
            .await
            .context("Failed to remove token")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_replace_and_clear() {
        let store = SqliteCredentialStore::in_memory().await.unwrap();
        assert_eq!(store.load_token().await.unwrap(), None);

        store.store_token("first").await.unwrap();
        store.store_token("second").await.unwrap();
        assert_eq!(store.load_token().await.unwrap().as_deref(), Some("second"));
        assert!(store.token_updated_at().await.unwrap().is_some());

        store.clear_token().await.unwrap();
        assert_eq!(store.load_token().await.unwrap(), None);
        assert_eq!(store.token_updated_at().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_token_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("creds.db");

        SqliteCredentialStore::open(&path)
            .await
            .unwrap()
            .store_token("abc")
            .await
            .unwrap();

        let reopened = SqliteCredentialStore::open(&path).await.unwrap();
        assert_eq!(reopened.load_token().await.unwrap().as_deref(), Some("abc"));
    }
}
