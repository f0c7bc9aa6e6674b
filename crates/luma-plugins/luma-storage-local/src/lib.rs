//! # luma-storage-local
//! luma/crates/luma-plugins/luma-storage-local/src/lib.rs
//! Local filesystem implementation of `KeyValueStore`.
//! Features: hashed file names, directory sharding, write-then-rename updates.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use luma_core::traits::KeyValueStore;
use sha2::{Digest, Sha256};
use tokio::fs;

pub struct LocalKeyValueStore {
    /// Root directory for all blobs (e.g., "./data/kv")
    root_path: PathBuf,
}

impl LocalKeyValueStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root_path: root }
    }

    /// Keys like `posts:alice` are not safe file names, so the file is named
    /// after the key's SHA-256 and sharded: "ab/cd/abcd...hash.json"
    fn get_sharded_path(&self, key: &str) -> PathBuf {
        let hash = hex::encode(Sha256::digest(key.as_bytes()));
        let mut path = self.root_path.clone();
        path.push(&hash[0..2]);
        path.push(&hash[2..4]);
        path.push(format!("{hash}.json"));
        path
    }
}

#[async_trait]
impl KeyValueStore for LocalKeyValueStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        match fs::read_to_string(self.get_sharded_path(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes to a sibling temp file first so a crash never leaves half a blob.
    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let target_path = self.get_sharded_path(key);
        if let Some(parent) = target_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let tmp_path = target_path.with_extension("json.tmp");
        fs::write(&tmp_path, value).await?;
        fs::rename(&tmp_path, &target_path).await?;
        log::debug!("wrote {} bytes for key {}", value.len(), key);
        Ok(())
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        match fs::remove_file(self.get_sharded_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use luma_core::{ContentStore, CurrentUser, NewPost, StoreSettings};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_set_get_remove() {
        let dir = tempfile::tempdir().unwrap();
        let kv = LocalKeyValueStore::new(dir.path().to_path_buf());

        assert_eq!(kv.get("posts:alice").await.unwrap(), None);
        kv.set("posts:alice", "[]").await.unwrap();
        kv.set("posts:alice", "[1]").await.unwrap();
        assert_eq!(kv.get("posts:alice").await.unwrap().as_deref(), Some("[1]"));

        kv.remove("posts:alice").await.unwrap();
        kv.remove("posts:alice").await.unwrap();
        assert_eq!(kv.get("posts:alice").await.unwrap(), None);
    }

    #[test]
    fn test_path_is_sharded_by_hash() {
        let kv = LocalKeyValueStore::new(PathBuf::from("/data"));
        let path = kv.get_sharded_path("drafts:bob");
        let file = path.file_name().unwrap().to_str().unwrap();

        assert!(file.ends_with(".json"));
        assert_eq!(path.parent().unwrap().file_name().unwrap().to_str().unwrap(), &file[2..4]);
        assert_ne!(path, kv.get_sharded_path("drafts:alice"));
    }

    #[tokio::test]
    async fn test_store_content_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let kv = Arc::new(LocalKeyValueStore::new(dir.path().to_path_buf()));
        let store = ContentStore::open(kv.clone(), StoreSettings::default()).await;
        let alice = CurrentUser::new("alice");
        let post = store.create_post(&alice, NewPost::text("on disk #local")).await;

        let kv = Arc::new(LocalKeyValueStore::new(dir.path().to_path_buf()));
        let reopened = ContentStore::open(kv, StoreSettings::default()).await;

        assert_eq!(reopened.post(&CurrentUser::new("bob"), post.id).await, Some(post));
    }
}
