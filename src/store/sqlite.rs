// SQLite-backed persistence for the two sets that must survive restarts.

use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::error::AppResult;
use crate::store::{NotifiedStore, SubscriberStore};

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(database_url: &str) -> AppResult<Self> {
        // A single connection is plenty for this service and keeps
        // `sqlite::memory:` pools (used in tests) on one shared database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS notified_keys (
                key TEXT PRIMARY KEY,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS subscribers (
                handle TEXT PRIMARY KEY,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&pool)
        .await?;

        info!("✓ SQLite store ready at {}", database_url);
        Ok(Self { pool })
    }
}

#[async_trait]
impl NotifiedStore for SqliteStore {
    async fn contains(&self, key: &str) -> AppResult<bool> {
        let found: Option<i32> =
            sqlx::query_scalar("SELECT 1 FROM notified_keys WHERE key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(found.is_some())
    }

    async fn add(&self, key: &str) -> AppResult<()> {
        sqlx::query("INSERT OR IGNORE INTO notified_keys (key) VALUES ($1)")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl SubscriberStore for SqliteStore {
    async fn register(&self, handle: &str) -> AppResult<()> {
        sqlx::query("INSERT OR IGNORE INTO subscribers (handle) VALUES ($1)")
            .bind(handle)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn all(&self) -> AppResult<Vec<String>> {
        let handles: Vec<String> =
            sqlx::query_scalar("SELECT handle FROM subscribers ORDER BY rowid")
                .fetch_all(&self.pool)
                .await?;

        Ok(handles)
    }
}
