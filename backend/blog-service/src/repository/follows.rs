use super::FollowRepository;
use crate::domain::FollowEdge;
use crate::error::ServiceResult;
use async_trait::async_trait;
use sqlx::PgPool;

/// Repository for follow edges. The table rejects self edges with a CHECK.
#[derive(Clone)]
pub struct PgFollowRepository {
    pool: PgPool,
}

impl PgFollowRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FollowRepository for PgFollowRepository {
    async fn toggle_follow(&self, follower_id: &str, followee_id: &str) -> ServiceResult<bool> {
        let followed: bool = sqlx::query_scalar(
            r#"
            WITH removed AS (
                DELETE FROM follows
                WHERE follower_id = $1 AND followee_id = $2
                RETURNING 1
            ), added AS (
                INSERT INTO follows (follower_id, followee_id, created_at)
                SELECT $1, $2, NOW()
                WHERE NOT EXISTS (SELECT 1 FROM removed)
                ON CONFLICT (follower_id, followee_id) DO NOTHING
                RETURNING 1
            )
            SELECT NOT EXISTS (SELECT 1 FROM removed)
            "#,
        )
        .bind(follower_id)
        .bind(followee_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(followed)
    }

    /// Idempotent create follow; returns true if a new row was inserted.
    async fn insert_follow(&self, follower_id: &str, followee_id: &str) -> ServiceResult<bool> {
        let inserted = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO follows (follower_id, followee_id, created_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (follower_id, followee_id) DO NOTHING
            RETURNING 1
            "#,
        )
        .bind(follower_id)
        .bind(followee_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(inserted.is_some())
    }

    /// Idempotent delete; returns true if a row was removed.
    async fn delete_follow(&self, follower_id: &str, followee_id: &str) -> ServiceResult<bool> {
        let affected = sqlx::query(
            r#"
            DELETE FROM follows
            WHERE follower_id = $1 AND followee_id = $2
            "#,
        )
        .bind(follower_id)
        .bind(followee_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(affected > 0)
    }

    async fn follow_exists(&self, follower_id: &str, followee_id: &str) -> ServiceResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM follows
                WHERE follower_id = $1 AND followee_id = $2
            )
            "#,
        )
        .bind(follower_id)
        .bind(followee_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn count_followers(&self, user_id: &str) -> ServiceResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE followee_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn count_following(&self, user_id: &str) -> ServiceResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE follower_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn list_following(&self, follower_id: &str, limit: i64) -> ServiceResult<Vec<FollowEdge>> {
        let edges = sqlx::query_as::<_, FollowEdge>(
            r#"
            SELECT follower_id, followee_id, created_at
            FROM follows
            WHERE follower_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(follower_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(edges)
    }
}
