use super::CommentRepository;
use crate::domain::{Comment, NewComment};
use crate::error::ServiceResult;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for Comment operations
#[derive(Clone)]
pub struct PgCommentRepository {
    pool: PgPool,
}

impl PgCommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepository for PgCommentRepository {
    async fn insert_comment(&self, comment: &NewComment) -> ServiceResult<Option<Comment>> {
        // Insert only when the post exists, in the same statement
        let created = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (id, post_id, author_id, author_name, content, created_at)
            SELECT $1, p.id, $3, $4, $5, NOW()
            FROM posts p
            WHERE p.id = $2
            RETURNING id, post_id, author_id, author_name, content, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(comment.post_id)
        .bind(&comment.author_id)
        .bind(&comment.author_name)
        .bind(&comment.content)
        .fetch_optional(&self.pool)
        .await?;

        Ok(created)
    }

    async fn list_comments_by_post(&self, post_id: Uuid) -> ServiceResult<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, post_id, author_id, author_name, content, created_at
            FROM comments
            WHERE post_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }
}
