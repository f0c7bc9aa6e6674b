//! # Persistence Adapter
//!
//! Serializes post and draft collections to JSON blobs in a [`KeyValueStore`].
//! Keys are namespaced per user (`posts:{id}`, `drafts:{id}`). An `authors`
//! index lists every user with stored content so a shared store can load all
//! of them at start-up.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::error::{AppError, Result};
use crate::models::{Draft, Post};
use crate::traits::KeyValueStore;

pub fn posts_key(user_id: &str) -> String {
    format!("posts:{user_id}")
}

pub fn drafts_key(user_id: &str) -> String {
    format!("drafts:{user_id}")
}

pub const AUTHORS_KEY: &str = "authors";

/// Everything persisted for one user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub posts: Vec<Post>,
    pub drafts: Vec<Draft>,
}

#[derive(Clone)]
pub struct ContentPersistence {
    kv: Arc<dyn KeyValueStore>,
}

impl ContentPersistence {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Writes the full post collection, replacing whatever was stored.
    pub async fn save_posts(&self, user_id: &str, posts: &[Post]) -> Result<()> {
        let json = serde_json::to_string(posts)?;
        self.kv
            .set(&posts_key(user_id), &json)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))
    }

    pub async fn save_drafts(&self, user_id: &str, drafts: &[Draft]) -> Result<()> {
        let json = serde_json::to_string(drafts)?;
        self.kv
            .set(&drafts_key(user_id), &json)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))
    }

    /// Reads both collections back. Missing keys yield empty collections.
    pub async fn load(&self, user_id: &str) -> Result<Snapshot> {
        let posts = self.read_list(&posts_key(user_id)).await?;
        let drafts = self.read_list(&drafts_key(user_id)).await?;
        log::debug!(
            "loaded {} posts and {} drafts for user {}",
            posts.len(),
            drafts.len(),
            user_id
        );
        Ok(Snapshot { posts, drafts })
    }

    pub async fn save_authors(&self, authors: &BTreeSet<String>) -> Result<()> {
        let json = serde_json::to_string(authors)?;
        self.kv
            .set(AUTHORS_KEY, &json)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))
    }

    pub async fn load_authors(&self) -> Result<BTreeSet<String>> {
        let authors: Vec<String> = self.read_list(AUTHORS_KEY).await?;
        Ok(authors.into_iter().collect())
    }

    /// Loads every indexed author and merges their content, most recent first.
    pub async fn load_all(&self) -> Result<(BTreeSet<String>, Snapshot)> {
        let authors = self.load_authors().await?;
        let mut merged = Snapshot::default();
        for author in &authors {
            let snapshot = self.load(author).await?;
            merged.posts.extend(snapshot.posts);
            merged.drafts.extend(snapshot.drafts);
        }
        merged.posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        merged.drafts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok((authors, merged))
    }

    /// Drops everything stored for the user.
    pub async fn clear(&self, user_id: &str) -> Result<()> {
        for key in [posts_key(user_id), drafts_key(user_id)] {
            self.kv
                .remove(&key)
                .await
                .map_err(|e| AppError::Storage(e.to_string()))?;
        }
        Ok(())
    }

    async fn read_list<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        let raw = self
            .kv
            .get(key)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;
        match raw {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Comment, Media, PostKind, Reactions, Visibility};
    use crate::traits::{MemoryKeyValueStore, MockKeyValueStore};
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    fn sample_post(author: &str) -> Post {
        let created = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let post_id = Uuid::now_v7();
        Post {
            id: post_id,
            author_id: author.into(),
            content: Some("sunset #beach".into()),
            media: Media {
                images: vec!["file:///photos/1.jpg".into()],
                video: None,
                audio: None,
            },
            kind: PostKind::Story,
            reactions: Reactions::from([("like", vec!["a", "b"]), ("love", vec!["c"])]),
            comments: vec![Comment {
                id: Uuid::now_v7(),
                post_id,
                author_id: "b".into(),
                content: "wow".into(),
                reactions: Reactions::default(),
                replies: vec![],
                created_at: created + Duration::minutes(3),
                is_edited: false,
            }],
            share_count: 2,
            created_at: created,
            updated_at: created + Duration::minutes(5),
            is_edited: true,
            tags: vec!["beach".into()],
            visibility: Visibility::FriendsOnly,
            location: Some("Lisbon".into()),
            mood: None,
            music_attribution: Some("Track - Artist".into()),
            is_story: true,
            story_expires_at: Some(created + Duration::hours(24)),
            is_pinned: true,
        }
    }

    #[tokio::test]
    async fn test_save_then_load_reproduces_posts() {
        let persistence = ContentPersistence::new(Arc::new(MemoryKeyValueStore::new()));
        let posts = vec![sample_post("alice"), sample_post("alice")];

        persistence.save_posts("alice", &posts).await.unwrap();
        let snapshot = persistence.load("alice").await.unwrap();

        assert_eq!(snapshot.posts, posts);
        assert!(snapshot.drafts.is_empty());
    }

    #[tokio::test]
    async fn test_users_do_not_share_keys() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let persistence = ContentPersistence::new(kv.clone());

        persistence.save_posts("alice", &[sample_post("alice")]).await.unwrap();

        assert!(persistence.load("bob").await.unwrap().posts.is_empty());
        assert!(kv.get("posts:alice").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_corrupt_blob_is_serialization_error() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        kv.set("posts:alice", "{not json").await.unwrap();
        let persistence = ContentPersistence::new(kv);

        let err = persistence.load("alice").await.unwrap_err();
        assert!(matches!(err, AppError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_backend_failure_is_storage_error() {
        let mut kv = MockKeyValueStore::new();
        kv.expect_set()
            .returning(|_, _| Err(anyhow::anyhow!("disk full")));
        let persistence = ContentPersistence::new(Arc::new(kv));

        let err = persistence.save_drafts("alice", &[]).await.unwrap_err();
        assert!(matches!(err, AppError::Storage(msg) if msg.contains("disk full")));
    }

    #[tokio::test]
    async fn test_load_all_merges_indexed_authors() {
        let persistence = ContentPersistence::new(Arc::new(MemoryKeyValueStore::new()));
        let mut older = sample_post("alice");
        older.created_at -= Duration::days(1);
        let newer = sample_post("bob");

        persistence.save_posts("alice", &[older.clone()]).await.unwrap();
        persistence.save_posts("bob", &[newer.clone()]).await.unwrap();
        // carol has content but is not indexed, so she is not loaded
        persistence.save_posts("carol", &[sample_post("carol")]).await.unwrap();
        let authors: BTreeSet<String> = ["alice".to_string(), "bob".to_string()].into();
        persistence.save_authors(&authors).await.unwrap();

        let (loaded_authors, snapshot) = persistence.load_all().await.unwrap();

        assert_eq!(loaded_authors, authors);
        assert_eq!(snapshot.posts, vec![newer, older]);
    }

    #[tokio::test]
    async fn test_load_all_without_index_is_empty() {
        let persistence = ContentPersistence::new(Arc::new(MemoryKeyValueStore::new()));
        let (authors, snapshot) = persistence.load_all().await.unwrap();
        assert!(authors.is_empty());
        assert_eq!(snapshot, Snapshot::default());
    }

    #[tokio::test]
    async fn test_clear_removes_both_keys() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let persistence = ContentPersistence::new(kv.clone());
        persistence.save_posts("alice", &[]).await.unwrap();
        persistence.save_drafts("alice", &[]).await.unwrap();

        persistence.clear("alice").await.unwrap();

        assert!(kv.is_empty());
    }
}
