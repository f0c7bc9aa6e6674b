//! # luma-db-sqlite Implementation
//!
//! This module implements `KeyValueStore` on top of a single SQLite table.
//! Each key holds one JSON blob; the content model never reaches SQL columns.

use std::str::FromStr;

use async_trait::async_trait;
use luma_core::traits::KeyValueStore;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;

pub struct SqliteKeyValueStore {
    pool: SqlitePool,
}

impl SqliteKeyValueStore {
    /// Opens (or creates) the database at `url` and ensures the schema exists.
    ///
    /// # Developer Note
    /// An in-memory database lives only as long as its connection, so the pool
    /// is pinned to a single connection that is never recycled.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool_options = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options.connect_with(options).await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .execute(&pool)
        .await?;

        log::info!("SQLite key-value store ready at {}", url);
        Ok(Self { pool })
    }
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| row.get::<String, _>("value")))
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use luma_core::{ContentStore, CurrentUser, NewDraft, NewPost, StoreSettings};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_upsert_and_remove() {
        let repo = SqliteKeyValueStore::new("sqlite::memory:").await.unwrap();

        repo.set("posts:alice", "[]").await.unwrap();
        repo.set("posts:alice", "[{}]").await.unwrap();
        assert_eq!(repo.get("posts:alice").await.unwrap().as_deref(), Some("[{}]"));

        let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM kv_store")
            .fetch_one(&repo.pool)
            .await
            .unwrap()
            .get("n");
        assert_eq!(count, 1);

        repo.remove("posts:alice").await.unwrap();
        assert!(repo.get("posts:alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_round_trip_through_sqlite() {
        let repo = Arc::new(SqliteKeyValueStore::new("sqlite::memory:").await.unwrap());
        let alice = CurrentUser::new("alice");
        let store = ContentStore::open(repo.clone(), StoreSettings::default()).await;
        let post = store.create_post(&alice, NewPost::text("stored #sql")).await;
        store.save_draft(&alice, NewDraft::default()).await;
        store.add_reaction(&CurrentUser::new("bob"), post.id, "like").await.unwrap();

        let reopened = ContentStore::open(repo, StoreSettings::default()).await;

        let posts = reopened.my_posts(&alice).await;
        assert_eq!(posts.len(), 1);
        assert!(posts[0].reactions.has_reacted("like", "bob"));
        assert_eq!(reopened.drafts(&alice).await.len(), 1);
    }
}
