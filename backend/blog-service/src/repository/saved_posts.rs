use super::SavedPostRepository;
use crate::domain::SavedPost;
use crate::error::ServiceResult;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for saved-post membership
#[derive(Clone)]
pub struct PgSavedPostRepository {
    pool: PgPool,
}

impl PgSavedPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SavedPostRepository for PgSavedPostRepository {
    /// Delete if present, otherwise insert. A lost insert race (conflict)
    /// leaves the pair present and reports `true`.
    async fn toggle_saved(&self, user_id: &str, post_id: Uuid) -> ServiceResult<bool> {
        let saved: bool = sqlx::query_scalar(
            r#"
            WITH removed AS (
                DELETE FROM saved_posts
                WHERE user_id = $1 AND post_id = $2
                RETURNING 1
            ), added AS (
                INSERT INTO saved_posts (user_id, post_id, saved_at)
                SELECT $1, $2, NOW()
                WHERE NOT EXISTS (SELECT 1 FROM removed)
                ON CONFLICT (user_id, post_id) DO NOTHING
                RETURNING 1
            )
            SELECT NOT EXISTS (SELECT 1 FROM removed)
            "#,
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(saved)
    }

    async fn insert_saved(&self, user_id: &str, post_id: Uuid) -> ServiceResult<bool> {
        let inserted = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO saved_posts (user_id, post_id, saved_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (user_id, post_id) DO NOTHING
            RETURNING 1
            "#,
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(inserted.is_some())
    }

    async fn delete_saved(&self, user_id: &str, post_id: Uuid) -> ServiceResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM saved_posts
            WHERE user_id = $1 AND post_id = $2
            "#,
        )
        .bind(user_id)
        .bind(post_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn saved_exists(&self, user_id: &str, post_id: Uuid) -> ServiceResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM saved_posts
                WHERE user_id = $1 AND post_id = $2
            )
            "#,
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn list_saved(&self, user_id: &str, limit: i64) -> ServiceResult<Vec<SavedPost>> {
        let saved = sqlx::query_as::<_, SavedPost>(
            r#"
            SELECT user_id, post_id, saved_at
            FROM saved_posts
            WHERE user_id = $1
            ORDER BY saved_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(saved)
    }
}
