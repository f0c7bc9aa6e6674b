//! # Content Store
//!
//! The single in-process authority for every user's posts and drafts.
//!
//! One store is shared by all sessions. Posts live in one collection ordered
//! most-recent-first; the public feed and per-author lists are derived from it
//! on every read, so feed membership always follows a post's current
//! visibility. The acting [`CurrentUser`] is passed to each operation.
//!
//! Storage stays namespaced per author: every mutation writes the affected
//! author's collection back through [`ContentPersistence`]. Write failures are
//! logged and the in-memory state is kept.
//!
//! Operations on unknown ids, or on posts the acting user may not touch, are
//! silent no-ops; they return `None`/`false` so callers can tell, but never an
//! error.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::{
    Comment, CurrentUser, Draft, FeedStats, NewDraft, NewPost, Post, PostPatch, PostStats,
    Reactions, UserId, Visibility,
};
use crate::persistence::ContentPersistence;
use crate::tags::extract_tags;
use crate::traits::{Clock, KeyValueStore, SystemClock};
use crate::views;

/// Tunables for a [`ContentStore`].
#[derive(Debug, Clone)]
pub struct StoreSettings {
    /// Simulated round trip before `refresh_feed` reloads from storage
    pub refresh_delay: StdDuration,
    /// Lifetime of a story, fixed at creation
    pub story_ttl: Duration,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            refresh_delay: StdDuration::from_secs(1),
            story_ttl: Duration::hours(24),
        }
    }
}

/// Who may act on a post.
#[derive(Debug, Clone, Copy)]
enum Access {
    /// Only the post's author (edits, pins, deletion)
    Author,
    /// Anyone who can see the post (reactions, comments, shares)
    Viewer,
}

impl Access {
    fn allows(self, post: &Post, user_id: &str) -> bool {
        match self {
            Access::Author => post.author_id == user_id,
            Access::Viewer => post.is_visible_to(user_id),
        }
    }
}

#[derive(Default)]
struct StoreState {
    /// Every user with content in storage
    authors: BTreeSet<UserId>,
    posts: Vec<Post>,
    drafts: Vec<Draft>,
}

pub struct ContentStore {
    persistence: ContentPersistence,
    clock: Arc<dyn Clock>,
    settings: StoreSettings,
    state: Mutex<StoreState>,
}

impl ContentStore {
    /// Creates an empty store. Call [`ContentStore::load`] to read persisted content.
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            persistence: ContentPersistence::new(kv),
            clock: Arc::new(SystemClock),
            settings: StoreSettings::default(),
            state: Mutex::new(StoreState::default()),
        }
    }

    pub fn with_settings(mut self, settings: StoreSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Creates a store and loads every author's persisted content.
    pub async fn open(kv: Arc<dyn KeyValueStore>, settings: StoreSettings) -> Self {
        let store = Self::new(kv).with_settings(settings);
        store.load().await;
        store
    }

    /// Replaces in-memory state with what storage holds. On failure the
    /// current state is kept.
    pub async fn load(&self) {
        let mut state = self.state.lock().await;
        self.reload(&mut state).await;
    }

    /// Reloads from storage after the configured delay.
    ///
    /// The store lock is held for the whole refresh, so writes issued meanwhile
    /// wait for it instead of being overwritten by the reload.
    pub async fn refresh_feed(&self) {
        let mut state = self.state.lock().await;
        tokio::time::sleep(self.settings.refresh_delay).await;
        self.reload(&mut state).await;
    }

    // ── Posts ───────────────────────────────────────────────────────────────

    pub async fn create_post(&self, user: &CurrentUser, new: NewPost) -> Post {
        let mut state = self.state.lock().await;
        let post = self.build_post(user, new);
        log::debug!("created post {} for user {}", post.id, post.author_id);
        state.posts.insert(0, post.clone());
        self.index_author(&mut state, &user.id).await;
        self.persist_posts(&state, &user.id).await;
        post
    }

    /// Creates a public story that expires after the configured TTL.
    pub async fn create_story(&self, user: &CurrentUser, new: NewPost) -> Post {
        let new = NewPost {
            is_story: true,
            visibility: Visibility::Public,
            ..new
        };
        self.create_post(user, new).await
    }

    /// Merges `patch` into one of the user's posts and marks it edited.
    ///
    /// Changing `content` without supplying `tags` re-derives the tags.
    pub async fn update_post(&self, user: &CurrentUser, post_id: Uuid, patch: PostPatch) -> Option<Post> {
        self.modify_post(user, post_id, Access::Author, |post| {
            apply_patch(post, patch);
            post.is_edited = true;
            true
        })
        .await
    }

    pub async fn delete_post(&self, user: &CurrentUser, post_id: Uuid) -> bool {
        let mut state = self.state.lock().await;
        let before = state.posts.len();
        state
            .posts
            .retain(|p| !(p.id == post_id && p.author_id == user.id));
        if state.posts.len() == before {
            return false;
        }
        self.persist_posts(&state, &user.id).await;
        true
    }

    pub async fn pin_post(&self, user: &CurrentUser, post_id: Uuid) -> Option<Post> {
        let patch = PostPatch { is_pinned: Some(true), ..Default::default() };
        self.update_post(user, post_id, patch).await
    }

    pub async fn unpin_post(&self, user: &CurrentUser, post_id: Uuid) -> Option<Post> {
        let patch = PostPatch { is_pinned: Some(false), ..Default::default() };
        self.update_post(user, post_id, patch).await
    }

    pub async fn share_post(&self, user: &CurrentUser, post_id: Uuid) -> Option<Post> {
        self.modify_post(user, post_id, Access::Viewer, |post| {
            post.share_count += 1;
            true
        })
        .await
    }

    /// Adds the user under `kind`. Adding twice has no further effect.
    pub async fn add_reaction(&self, user: &CurrentUser, post_id: Uuid, kind: &str) -> Option<Post> {
        self.modify_post(user, post_id, Access::Viewer, |post| post.reactions.add(kind, &user.id))
            .await
    }

    /// Removes the user from `kind`, leaving the bucket in place.
    pub async fn remove_reaction(&self, user: &CurrentUser, post_id: Uuid, kind: &str) -> Option<Post> {
        self.modify_post(user, post_id, Access::Viewer, |post| post.reactions.remove(kind, &user.id))
            .await
    }

    // ── Comments ────────────────────────────────────────────────────────────

    /// Appends a comment, or a reply when `parent_id` names a top-level comment.
    ///
    /// Replies nest one level deep: a `parent_id` that names a reply, or nothing
    /// at all, drops the comment and returns `None`.
    pub async fn add_comment(
        &self,
        user: &CurrentUser,
        post_id: Uuid,
        content: &str,
        parent_id: Option<Uuid>,
    ) -> Option<Comment> {
        let mut state = self.state.lock().await;
        let now = self.clock.now();
        let post = state
            .posts
            .iter_mut()
            .find(|p| p.id == post_id && p.is_visible_to(&user.id))?;

        let comment = Comment {
            id: Uuid::now_v7(),
            post_id,
            author_id: user.id.clone(),
            content: content.to_string(),
            reactions: Reactions::default(),
            replies: Vec::new(),
            created_at: now,
            is_edited: false,
        };

        match parent_id {
            Some(parent_id) => {
                let Some(parent) = post.comments.iter_mut().find(|c| c.id == parent_id) else {
                    log::debug!("dropping reply on post {post_id}: no top-level comment {parent_id}");
                    return None;
                };
                parent.replies.push(comment.clone());
            }
            None => post.comments.push(comment.clone()),
        }
        post.updated_at = now;
        let author = post.author_id.clone();

        self.persist_posts(&state, &author).await;
        Some(comment)
    }

    /// Removes a comment or reply. Allowed for its author and for the post's author.
    pub async fn delete_comment(&self, user: &CurrentUser, comment_id: Uuid) -> bool {
        let mut state = self.state.lock().await;
        let now = self.clock.now();
        let Some(post) = state.posts.iter_mut().find(|p| {
            p.find_comment(comment_id)
                .is_some_and(|c| c.author_id == user.id || p.author_id == user.id)
        }) else {
            return false;
        };

        post.comments.retain(|c| c.id != comment_id);
        for comment in post.comments.iter_mut() {
            comment.replies.retain(|r| r.id != comment_id);
        }
        post.updated_at = now;
        let author = post.author_id.clone();

        self.persist_posts(&state, &author).await;
        true
    }

    // ── Drafts ──────────────────────────────────────────────────────────────

    pub async fn save_draft(&self, user: &CurrentUser, new: NewDraft) -> Draft {
        let mut state = self.state.lock().await;
        let draft = Draft {
            id: Uuid::now_v7(),
            author_id: user.id.clone(),
            content: new.content,
            media: new.media,
            kind: new.kind,
            visibility: new.visibility,
            tags: new.tags,
            mood: new.mood,
            location: new.location,
            created_at: self.clock.now(),
        };
        state.drafts.insert(0, draft.clone());
        self.index_author(&mut state, &user.id).await;
        self.persist_drafts(&state, &user.id).await;
        draft
    }

    /// Replaces a draft's editable fields, keeping its id and creation time.
    pub async fn update_draft(&self, user: &CurrentUser, draft_id: Uuid, new: NewDraft) -> Option<Draft> {
        let mut state = self.state.lock().await;
        let draft = state
            .drafts
            .iter_mut()
            .find(|d| d.id == draft_id && d.author_id == user.id)?;
        draft.content = new.content;
        draft.media = new.media;
        draft.kind = new.kind;
        draft.visibility = new.visibility;
        draft.tags = new.tags;
        draft.mood = new.mood;
        draft.location = new.location;
        let updated = draft.clone();
        self.persist_drafts(&state, &user.id).await;
        Some(updated)
    }

    pub async fn delete_draft(&self, user: &CurrentUser, draft_id: Uuid) -> bool {
        let mut state = self.state.lock().await;
        let before = state.drafts.len();
        state
            .drafts
            .retain(|d| !(d.id == draft_id && d.author_id == user.id));
        if state.drafts.len() == before {
            return false;
        }
        self.persist_drafts(&state, &user.id).await;
        true
    }

    /// Turns a draft into a new post (fresh id) and deletes the draft, under one lock.
    pub async fn publish_draft(&self, user: &CurrentUser, draft_id: Uuid) -> Option<Post> {
        let mut state = self.state.lock().await;
        let index = state
            .drafts
            .iter()
            .position(|d| d.id == draft_id && d.author_id == user.id)?;
        let draft = state.drafts.remove(index);
        let post = self.build_post(user, NewPost::from(&draft));
        log::debug!("published draft {} as post {}", draft.id, post.id);
        state.posts.insert(0, post.clone());
        self.index_author(&mut state, &user.id).await;
        self.persist_posts(&state, &user.id).await;
        self.persist_drafts(&state, &user.id).await;
        Some(post)
    }

    pub async fn drafts(&self, user: &CurrentUser) -> Vec<Draft> {
        let state = self.state.lock().await;
        state
            .drafts
            .iter()
            .filter(|d| d.author_id == user.id)
            .cloned()
            .collect()
    }

    // ── Views ───────────────────────────────────────────────────────────────

    /// A post the user can see: any public post, or one of their own.
    pub async fn post(&self, user: &CurrentUser, post_id: Uuid) -> Option<Post> {
        let state = self.state.lock().await;
        state
            .posts
            .iter()
            .find(|p| p.id == post_id && p.is_visible_to(&user.id))
            .cloned()
    }

    /// Every post the user owns, whatever its visibility.
    pub async fn my_posts(&self, user: &CurrentUser) -> Vec<Post> {
        let state = self.state.lock().await;
        state
            .posts
            .iter()
            .filter(|p| p.author_id == user.id)
            .cloned()
            .collect()
    }

    pub async fn public_posts(&self) -> Vec<Post> {
        let state = self.state.lock().await;
        views::public_posts(&state.posts).cloned().collect()
    }

    pub async fn user_posts(&self, user_id: &str) -> Vec<Post> {
        let state = self.state.lock().await;
        views::user_posts(&state.posts, user_id).cloned().collect()
    }

    pub async fn active_stories(&self, author: Option<&str>) -> Vec<Post> {
        let state = self.state.lock().await;
        views::active_stories(&state.posts, self.clock.now(), author)
            .cloned()
            .collect()
    }

    /// All-zero stats for unknown posts and posts the user cannot see.
    pub async fn post_stats(&self, user: &CurrentUser, post_id: Uuid) -> PostStats {
        let state = self.state.lock().await;
        state
            .posts
            .iter()
            .find(|p| p.id == post_id && p.is_visible_to(&user.id))
            .map(views::post_stats)
            .unwrap_or_default()
    }

    pub async fn feed_stats(&self, user: &CurrentUser) -> FeedStats {
        let state = self.state.lock().await;
        views::feed_stats(state.posts.iter().filter(|p| p.author_id == user.id))
    }

    // ── Internals ───────────────────────────────────────────────────────────

    fn build_post(&self, user: &CurrentUser, new: NewPost) -> Post {
        let now = self.clock.now();
        let tags = new
            .tags
            .unwrap_or_else(|| new.content.as_deref().map(extract_tags).unwrap_or_default());
        let story_expires_at = new.is_story.then(|| self.story_expiry(now));
        Post {
            id: Uuid::now_v7(),
            author_id: user.id.clone(),
            content: new.content,
            media: new.media,
            kind: new.kind,
            reactions: Reactions::default(),
            comments: Vec::new(),
            share_count: 0,
            created_at: now,
            updated_at: now,
            is_edited: false,
            tags,
            visibility: new.visibility,
            location: new.location,
            mood: new.mood,
            music_attribution: new.music_attribution,
            is_story: new.is_story,
            story_expires_at,
            is_pinned: false,
        }
    }

    /// `now + story_ttl`, saturating at the latest representable instant.
    fn story_expiry(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_add_signed(self.settings.story_ttl).unwrap_or_else(|| {
            log::warn!("story TTL {} overflows; story never expires", self.settings.story_ttl);
            DateTime::<Utc>::MAX_UTC
        })
    }

    /// Applies `edit` to one post the user may access; when it reports a
    /// change, bumps `updated_at` and persists under the post's author.
    async fn modify_post<F>(&self, user: &CurrentUser, post_id: Uuid, access: Access, edit: F) -> Option<Post>
    where
        F: FnOnce(&mut Post) -> bool,
    {
        let mut state = self.state.lock().await;
        let now = self.clock.now();
        let post = state
            .posts
            .iter_mut()
            .find(|p| p.id == post_id && access.allows(p, &user.id))?;
        if !edit(post) {
            return Some(post.clone());
        }
        post.updated_at = now;
        let updated = post.clone();
        self.persist_posts(&state, &updated.author_id).await;
        Some(updated)
    }

    /// Records `author` in the authors index, writing the index when it grows.
    async fn index_author(&self, state: &mut StoreState, author: &str) {
        if state.authors.contains(author) {
            return;
        }
        state.authors.insert(author.to_string());
        if let Err(e) = self.persistence.save_authors(&state.authors).await {
            log::error!("failed to persist authors index: {}", e);
        }
    }

    async fn reload(&self, state: &mut StoreState) {
        match self.persistence.load_all().await {
            Ok((authors, snapshot)) => {
                log::info!(
                    "loaded {} posts and {} drafts from {} authors",
                    snapshot.posts.len(),
                    snapshot.drafts.len(),
                    authors.len()
                );
                state.authors = authors;
                state.posts = snapshot.posts;
                state.drafts = snapshot.drafts;
            }
            Err(e) => log::error!("failed to load content: {}", e),
        }
    }

    async fn persist_posts(&self, state: &StoreState, author: &str) {
        let owned: Vec<Post> = state
            .posts
            .iter()
            .filter(|p| p.author_id == author)
            .cloned()
            .collect();
        if let Err(e) = self.persistence.save_posts(author, &owned).await {
            log::error!("failed to persist posts for user {}: {}", author, e);
        }
    }

    async fn persist_drafts(&self, state: &StoreState, author: &str) {
        let owned: Vec<Draft> = state
            .drafts
            .iter()
            .filter(|d| d.author_id == author)
            .cloned()
            .collect();
        if let Err(e) = self.persistence.save_drafts(author, &owned).await {
            log::error!("failed to persist drafts for user {}: {}", author, e);
        }
    }
}

fn apply_patch(post: &mut Post, patch: PostPatch) {
    if let Some(content) = patch.content {
        if patch.tags.is_none() {
            post.tags = extract_tags(&content);
        }
        post.content = Some(content);
    }
    if let Some(media) = patch.media {
        post.media = media;
    }
    if let Some(kind) = patch.kind {
        post.kind = kind;
    }
    if let Some(visibility) = patch.visibility {
        post.visibility = visibility;
    }
    if let Some(tags) = patch.tags {
        post.tags = tags;
    }
    if let Some(location) = patch.location {
        post.location = location;
    }
    if let Some(mood) = patch.mood {
        post.mood = mood;
    }
    if let Some(music) = patch.music_attribution {
        post.music_attribution = music;
    }
    if let Some(pinned) = patch.is_pinned {
        post.is_pinned = pinned;
    }
}
