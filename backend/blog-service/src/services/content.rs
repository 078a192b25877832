//! Content store - post and comment lifecycle on top of the repositories

use super::clamp_limit;
use crate::domain::{ClapDelta, Comment, NewComment, NewPost, Post};
use crate::error::{ServiceError, ServiceResult};
use crate::repository::{CommentRepository, PostRepository};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct ContentStore {
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
}

impl ContentStore {
    pub fn new(posts: Arc<dyn PostRepository>, comments: Arc<dyn CommentRepository>) -> Self {
        Self { posts, comments }
    }

    /// Validate and persist a post. `published_at` is now, `claps` starts at zero.
    pub async fn create_post(&self, new_post: NewPost) -> ServiceResult<Post> {
        new_post.validate()?;

        let post = self.posts.insert_post(&new_post).await?;
        info!(post_id = %post.id, author_id = %post.author_id, "post created");
        Ok(post)
    }

    pub async fn get_by_id(&self, post_id: Uuid) -> ServiceResult<Post> {
        self.posts
            .find_post(post_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("post {}", post_id)))
    }

    /// Posts for the given ids; unknown ids are skipped
    pub async fn find_many(&self, post_ids: &[Uuid]) -> ServiceResult<Vec<Post>> {
        self.posts.find_posts(post_ids).await
    }

    /// Newest post, if any
    pub async fn latest(&self) -> ServiceResult<Option<Post>> {
        Ok(self.posts.list_recent_posts(1).await?.into_iter().next())
    }

    /// Snapshot of the newest posts, newest first
    pub async fn list_recent(&self, limit: i64) -> ServiceResult<Vec<Post>> {
        let posts = self.posts.list_recent_posts(clamp_limit(limit)).await?;
        debug!(count = posts.len(), "listed recent posts");
        Ok(posts)
    }

    pub async fn list_by_author(&self, author_id: &str, limit: i64) -> ServiceResult<Vec<Post>> {
        self.posts
            .list_posts_by_author(author_id, clamp_limit(limit))
            .await
    }

    /// Apply one clap (or take one back) at the store; returns the new total.
    pub async fn increment_claps(&self, post_id: Uuid, delta: ClapDelta) -> ServiceResult<i64> {
        let claps = self
            .posts
            .add_claps(post_id, delta.as_i64())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("post {}", post_id)))?;

        debug!(%post_id, claps, "clap counter updated");
        Ok(claps)
    }

    pub async fn create_comment(&self, new_comment: NewComment) -> ServiceResult<Comment> {
        new_comment.validate()?;

        let comment = self
            .comments
            .insert_comment(&new_comment)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("post {}", new_comment.post_id)))?;

        info!(
            comment_id = %comment.id,
            post_id = %comment.post_id,
            author_id = %comment.author_id,
            "comment created"
        );
        Ok(comment)
    }

    /// Comments on a post, newest first
    pub async fn list_comments_by_post(&self, post_id: Uuid) -> ServiceResult<Vec<Comment>> {
        self.comments.list_comments_by_post(post_id).await
    }
}
