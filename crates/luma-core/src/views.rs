//! # Derived Views
//!
//! Pure queries over a post collection ordered most-recent-first.
//! Nothing here is cached; callers recompute on every read.

use chrono::{DateTime, Utc};

use crate::models::{FeedStats, Post, PostStats};

/// Posts whose current visibility is public, in collection order.
pub fn public_posts(posts: &[Post]) -> impl Iterator<Item = &Post> {
    posts.iter().filter(|p| p.is_public())
}

/// The public feed restricted to one author.
pub fn user_posts<'a>(posts: &'a [Post], user_id: &'a str) -> impl Iterator<Item = &'a Post> {
    public_posts(posts).filter(move |p| p.author_id == user_id)
}

/// Unexpired stories in the public feed, optionally for a single author.
pub fn active_stories<'a>(
    posts: &'a [Post],
    now: DateTime<Utc>,
    author: Option<&'a str>,
) -> impl Iterator<Item = &'a Post> {
    public_posts(posts)
        .filter(move |p| p.is_active_story(now))
        .filter(move |p| author.map_or(true, |a| p.author_id == a))
}

/// Engagement estimates for one post.
///
/// `views = reactions*10 + comments*15 + shares*5`,
/// `reach = reactions*8 + shares*20`, where `comments` includes replies.
pub fn post_stats(post: &Post) -> PostStats {
    let reactions = post.reactions.total() as u64;
    let comments = post.comment_count() as u64;
    let shares = post.share_count;
    PostStats {
        reactions,
        comments,
        views: reactions * 10 + comments * 15 + shares * 5,
        reach: reactions * 8 + shares * 20,
    }
}

pub fn feed_stats<'a>(posts: impl IntoIterator<Item = &'a Post>) -> FeedStats {
    posts.into_iter().fold(FeedStats::default(), |mut acc, p| {
        acc.posts += 1;
        acc.stories += u64::from(p.is_story);
        acc.reactions += p.reactions.total() as u64;
        acc.comments += p.comment_count() as u64;
        acc.shares += p.share_count;
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Comment, Media, PostKind, Reactions, Visibility};
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn post(author: &str, visibility: Visibility) -> Post {
        Post {
            id: Uuid::now_v7(),
            author_id: author.into(),
            content: None,
            media: Media::default(),
            kind: PostKind::Text,
            reactions: Reactions::default(),
            comments: vec![],
            share_count: 0,
            created_at: t0(),
            updated_at: t0(),
            is_edited: false,
            tags: vec![],
            visibility,
            location: None,
            mood: None,
            music_attribution: None,
            is_story: false,
            story_expires_at: None,
            is_pinned: false,
        }
    }

    fn comment(post_id: Uuid, replies: Vec<Comment>) -> Comment {
        Comment {
            id: Uuid::now_v7(),
            post_id,
            author_id: "x".into(),
            content: "c".into(),
            reactions: Reactions::default(),
            replies,
            created_at: t0(),
            is_edited: false,
        }
    }

    #[test]
    fn test_post_stats_formula() {
        let mut p = post("a", Visibility::Public);
        p.reactions = Reactions::from([("like", vec!["a", "b"]), ("love", vec!["c"])]);
        let reply = comment(p.id, vec![]);
        p.comments = vec![comment(p.id, vec![reply]), comment(p.id, vec![])];
        p.share_count = 3;

        assert_eq!(
            post_stats(&p),
            PostStats {
                reactions: 3,
                comments: 3,
                views: 90,
                reach: 84
            }
        );
    }

    #[test]
    fn test_user_posts_only_public() {
        let posts = vec![
            post("a", Visibility::Public),
            post("a", Visibility::Private),
            post("b", Visibility::Public),
            post("a", Visibility::FriendsOnly),
        ];
        assert_eq!(user_posts(&posts, "a").count(), 1);
        assert_eq!(public_posts(&posts).count(), 2);
    }

    #[test]
    fn test_active_stories_window() {
        let mut story = post("a", Visibility::Public);
        story.is_story = true;
        story.story_expires_at = Some(t0() + Duration::hours(24));
        let posts = vec![story, post("a", Visibility::Public)];

        assert_eq!(active_stories(&posts, t0(), None).count(), 1);
        assert_eq!(active_stories(&posts, t0() + Duration::hours(24), None).count(), 0);
        assert_eq!(active_stories(&posts, t0(), Some("b")).count(), 0);
    }

    #[test]
    fn test_feed_stats_sums() {
        let mut a = post("a", Visibility::Public);
        a.is_story = true;
        a.share_count = 4;
        a.reactions = Reactions::from([("like", vec!["x"])]);
        let mut b = post("a", Visibility::Private);
        b.comments = vec![comment(b.id, vec![])];

        let stats = feed_stats(&[a, b]);
        assert_eq!(stats.posts, 2);
        assert_eq!(stats.stories, 1);
        assert_eq!(stats.reactions, 1);
        assert_eq!(stats.comments, 1);
        assert_eq!(stats.shares, 4);
    }
}
