//! Durable store access.
//!
//! Every membership write is a single conditional statement against a
//! uniqueness-constrained set; every counter change is a single atomic delta.
//! Callers never read-then-write.

pub mod comments;
pub mod follows;
pub mod memory;
pub mod posts;
pub mod saved_posts;

use crate::domain::{Comment, FollowEdge, NewComment, NewPost, Post, SavedPost};
use crate::error::ServiceResult;
use async_trait::async_trait;
use uuid::Uuid;

pub use comments::PgCommentRepository;
pub use follows::PgFollowRepository;
pub use memory::InMemoryStore;
pub use posts::PgPostRepository;
pub use saved_posts::PgSavedPostRepository;

#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert a validated post; the store assigns id and timestamps
    async fn insert_post(&self, post: &NewPost) -> ServiceResult<Post>;

    async fn find_post(&self, post_id: Uuid) -> ServiceResult<Option<Post>>;

    /// Fetch several posts; unknown ids are skipped, order is unspecified
    async fn find_posts(&self, post_ids: &[Uuid]) -> ServiceResult<Vec<Post>>;

    /// Newest first
    async fn list_recent_posts(&self, limit: i64) -> ServiceResult<Vec<Post>>;

    /// Newest first
    async fn list_posts_by_author(&self, author_id: &str, limit: i64) -> ServiceResult<Vec<Post>>;

    /// Atomically add `delta` to the clap counter, clamped at zero.
    /// Returns the new total, or `None` if the post does not exist.
    async fn add_claps(&self, post_id: Uuid, delta: i64) -> ServiceResult<Option<i64>>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Insert a comment; `None` if the target post does not exist
    async fn insert_comment(&self, comment: &NewComment) -> ServiceResult<Option<Comment>>;

    /// Newest first
    async fn list_comments_by_post(&self, post_id: Uuid) -> ServiceResult<Vec<Comment>>;
}

#[async_trait]
pub trait SavedPostRepository: Send + Sync {
    /// Flip membership in one conditional write; returns whether the pair is now present
    async fn toggle_saved(&self, user_id: &str, post_id: Uuid) -> ServiceResult<bool>;

    /// Insert-or-noop; true if a row was inserted
    async fn insert_saved(&self, user_id: &str, post_id: Uuid) -> ServiceResult<bool>;

    /// Delete-or-noop; true if a row was removed
    async fn delete_saved(&self, user_id: &str, post_id: Uuid) -> ServiceResult<bool>;

    async fn saved_exists(&self, user_id: &str, post_id: Uuid) -> ServiceResult<bool>;

    /// Most recently saved first
    async fn list_saved(&self, user_id: &str, limit: i64) -> ServiceResult<Vec<SavedPost>>;
}

#[async_trait]
pub trait FollowRepository: Send + Sync {
    /// Flip membership in one conditional write; returns whether the edge is now present
    async fn toggle_follow(&self, follower_id: &str, followee_id: &str) -> ServiceResult<bool>;

    /// Insert-or-noop; true if a row was inserted
    async fn insert_follow(&self, follower_id: &str, followee_id: &str) -> ServiceResult<bool>;

    /// Delete-or-noop; true if a row was removed
    async fn delete_follow(&self, follower_id: &str, followee_id: &str) -> ServiceResult<bool>;

    async fn follow_exists(&self, follower_id: &str, followee_id: &str) -> ServiceResult<bool>;

    async fn count_followers(&self, user_id: &str) -> ServiceResult<i64>;

    async fn count_following(&self, user_id: &str) -> ServiceResult<i64>;

    /// Edges where `follower_id` is the follower, newest first
    async fn list_following(&self, follower_id: &str, limit: i64) -> ServiceResult<Vec<FollowEdge>>;
}
