//! # Domain Models
//!
//! These structs represent the core entities of the Luma content store.
//! We use UUID v7 for time-ordered, globally unique identification.
//! User identifiers come from the upstream auth provider and stay opaque strings.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Identifier handed to us by the auth provider.
pub type UserId = String;

/// The signed-in user, as supplied by the auth context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl CurrentUser {
    pub fn new(id: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
            avatar_url: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostKind {
    #[default]
    Text,
    Image,
    Video,
    Audio,
    Story,
    Memory,
    Achievement,
}

/// Audience scope of a post or draft.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Visibility {
    #[default]
    Public,
    FriendsOnly,
    Private,
}

/// Media attached to a post. Video and audio are not checked for exclusivity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    #[serde(default)]
    pub images: Vec<String>,
    pub video: Option<String>,
    pub audio: Option<String>,
}

/// Reaction kind label -> users who reacted with it.
///
/// A user appears at most once per kind but may hold several kinds at once.
/// Buckets are created lazily and left in place once emptied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reactions(BTreeMap<String, Vec<UserId>>);

impl Reactions {
    /// Returns `true` if the user was not already present under `kind`.
    pub fn add(&mut self, kind: &str, user_id: &str) -> bool {
        let bucket = self.0.entry(kind.to_string()).or_default();
        if bucket.iter().any(|u| u == user_id) {
            return false;
        }
        bucket.push(user_id.to_string());
        true
    }

    /// Returns `true` if the user was removed from `kind`.
    pub fn remove(&mut self, kind: &str, user_id: &str) -> bool {
        match self.0.get_mut(kind) {
            Some(bucket) => {
                let before = bucket.len();
                bucket.retain(|u| u != user_id);
                bucket.len() != before
            }
            None => false,
        }
    }

    pub fn users(&self, kind: &str) -> &[UserId] {
        self.0.get(kind).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Sum of bucket sizes across all kinds.
    pub fn total(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn has_reacted(&self, kind: &str, user_id: &str) -> bool {
        self.users(kind).iter().any(|u| u == user_id)
    }
}

impl<K: Into<String>, const N: usize> From<[(K, Vec<&str>); N]> for Reactions {
    fn from(entries: [(K, Vec<&str>); N]) -> Self {
        Self(
            entries
                .into_iter()
                .map(|(k, users)| (k.into(), users.into_iter().map(str::to_string).collect()))
                .collect(),
        )
    }
}

/// A comment on a post. Only top-level comments carry replies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    /// Back-reference to the owning post
    pub post_id: Uuid,
    pub author_id: UserId,
    pub content: String,
    #[serde(default)]
    pub reactions: Reactions,
    #[serde(default)]
    pub replies: Vec<Comment>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_edited: bool,
}

/// The fundamental unit of user-authored content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: UserId,
    pub content: Option<String>,
    #[serde(default)]
    pub media: Media,
    #[serde(default)]
    pub kind: PostKind,
    #[serde(default)]
    pub reactions: Reactions,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub share_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub is_edited: bool,
    /// Hashtags in order of appearance, case preserved, duplicates kept
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub visibility: Visibility,
    pub location: Option<String>,
    pub mood: Option<String>,
    pub music_attribution: Option<String>,
    #[serde(default)]
    pub is_story: bool,
    /// Fixed at creation for stories; never recalculated
    pub story_expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_pinned: bool,
}

impl Post {
    /// Top-level comments plus their replies.
    pub fn comment_count(&self) -> usize {
        self.comments.len() + self.comments.iter().map(|c| c.replies.len()).sum::<usize>()
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// Public posts are visible to everyone; anything else only to its author.
    pub fn is_visible_to(&self, user_id: &str) -> bool {
        self.is_public() || self.author_id == user_id
    }

    pub fn is_active_story(&self, now: DateTime<Utc>) -> bool {
        self.is_story && self.story_expires_at.is_some_and(|expires| expires > now)
    }

    /// Finds a top-level comment or a reply by id.
    pub fn find_comment(&self, comment_id: Uuid) -> Option<&Comment> {
        self.comments.iter().find_map(|c| {
            if c.id == comment_id {
                Some(c)
            } else {
                c.replies.iter().find(|r| r.id == comment_id)
            }
        })
    }
}

/// Fields accepted when creating a post. Anything missing is defaulted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewPost {
    pub content: Option<String>,
    pub media: Media,
    pub kind: PostKind,
    pub visibility: Visibility,
    /// When `None`, tags are extracted from `content`
    pub tags: Option<Vec<String>>,
    pub location: Option<String>,
    pub mood: Option<String>,
    pub music_attribution: Option<String>,
    pub is_story: bool,
}

impl NewPost {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }
}

/// Partial update merged into an existing post. `None` leaves a field untouched.
///
/// The descriptive fields are double options: `Some(None)` (JSON `null`)
/// clears the value, an absent key leaves it alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostPatch {
    pub content: Option<String>,
    pub media: Option<Media>,
    pub kind: Option<PostKind>,
    pub visibility: Option<Visibility>,
    pub tags: Option<Vec<String>>,
    #[serde(deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub location: Option<Option<String>>,
    #[serde(deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub mood: Option<Option<String>>,
    #[serde(deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub music_attribution: Option<Option<String>>,
    pub is_pinned: Option<bool>,
}

/// Marks a key that was present in the input, even when its value is `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// An unpublished post. Publishing creates a new post with a fresh id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub id: Uuid,
    pub author_id: UserId,
    pub content: Option<String>,
    #[serde(default)]
    pub media: Media,
    #[serde(default)]
    pub kind: PostKind,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub tags: Vec<String>,
    pub mood: Option<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewDraft {
    pub content: Option<String>,
    pub media: Media,
    pub kind: PostKind,
    pub visibility: Visibility,
    pub tags: Vec<String>,
    pub mood: Option<String>,
    pub location: Option<String>,
}

impl From<&Draft> for NewPost {
    fn from(draft: &Draft) -> Self {
        Self {
            content: draft.content.clone(),
            media: draft.media.clone(),
            kind: draft.kind,
            visibility: draft.visibility,
            // An empty tag list on a draft means "derive from content"
            tags: (!draft.tags.is_empty()).then(|| draft.tags.clone()),
            location: draft.location.clone(),
            mood: draft.mood.clone(),
            music_attribution: None,
            is_story: false,
        }
    }
}

/// Presentation estimates for a single post. Views and reach are not measured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostStats {
    pub reactions: u64,
    pub comments: u64,
    pub views: u64,
    pub reach: u64,
}

/// Aggregate over every post the signed-in user owns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedStats {
    pub posts: u64,
    pub stories: u64,
    pub reactions: u64,
    pub comments: u64,
    pub shares: u64,
}
