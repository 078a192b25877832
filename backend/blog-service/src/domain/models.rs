use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Average reading speed used for `read_time_min`.
const WORDS_PER_MINUTE: usize = 200;

/// Post entity. Immutable after creation except for `claps`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub author_id: String,
    /// Snapshot of the author's display name at creation time
    pub author_name: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub content: String,
    pub thumbnail_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub published_at: DateTime<Utc>,
    pub claps: i64,
    pub read_time_min: i32,
}

/// Comment entity - append-only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: String,
    pub author_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Follow edge - unique (follower_id, followee_id), never a self edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct FollowEdge {
    pub follower_id: String,
    pub followee_id: String,
    pub created_at: DateTime<Utc>,
}

/// Saved post marker - unique (user_id, post_id)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SavedPost {
    pub user_id: String,
    pub post_id: Uuid,
    pub saved_at: DateTime<Utc>,
}

/// Public projection of an externally owned user record. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub username: String,
    pub profile_picture_url: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowStats {
    pub followers: i64,
    pub following: i64,
}

/// State of a save pair after a toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveToggle {
    pub saved: bool,
}

/// State of a follow pair after a toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowToggle {
    pub followed: bool,
}

/// Validated input for post creation
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewPost {
    #[validate(length(min = 1, message = "author id is required"))]
    pub author_id: String,
    pub author_name: String,
    #[validate(length(min = 1, max = 100, message = "title must be 1-100 characters"))]
    pub title: String,
    #[validate(length(max = 200, message = "subtitle must be at most 200 characters"))]
    pub subtitle: Option<String>,
    #[validate(length(min = 1, max = 280, message = "content must be 1-280 characters"))]
    pub content: String,
    #[validate(url(message = "thumbnail must be a well-formed URL"))]
    pub thumbnail_url: Option<String>,
}

impl NewPost {
    pub fn read_time_min(&self) -> i32 {
        read_time_minutes(&self.content)
    }
}

/// Validated input for comment creation
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewComment {
    pub post_id: Uuid,
    #[validate(length(min = 1, message = "author id is required"))]
    pub author_id: String,
    pub author_name: String,
    #[validate(length(min = 1, message = "comment must not be empty"))]
    pub content: String,
}

/// Unit change applied to a clap counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClapDelta {
    Up,
    Down,
}

impl ClapDelta {
    pub fn as_i64(self) -> i64 {
        match self {
            ClapDelta::Up => 1,
            ClapDelta::Down => -1,
        }
    }
}

impl From<bool> for ClapDelta {
    /// `true` claps, `false` takes a clap back.
    fn from(increment: bool) -> Self {
        if increment {
            ClapDelta::Up
        } else {
            ClapDelta::Down
        }
    }
}

/// Post joined with its author's identity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostWithAuthor {
    pub post: Post,
    pub author: Identity,
}

/// Comment joined with its author's avatar
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentWithAvatar {
    pub comment: Comment,
    pub author_avatar_url: String,
}

/// Post page read model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostDetail {
    pub post: Post,
    pub author: Identity,
    pub author_stats: FollowStats,
    /// Whether the viewing user saved this post; `None` for anonymous viewers
    pub saved_by_viewer: Option<bool>,
}

/// Estimated reading time in whole minutes, never below one.
pub fn read_time_minutes(content: &str) -> i32 {
    let words = content.split_whitespace().count();
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    i32::try_from(minutes).unwrap_or(i32::MAX)
}
