use super::PostRepository;
use crate::domain::{NewPost, Post};
use crate::error::ServiceResult;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

const POST_COLUMNS: &str = "id, author_id, author_name, title, subtitle, content, thumbnail_url, \
                            created_at, published_at, claps, read_time_min";

/// Repository for Post operations
#[derive(Clone)]
pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn insert_post(&self, post: &NewPost) -> ServiceResult<Post> {
        let query = format!(
            r#"
            INSERT INTO posts (id, author_id, author_name, title, subtitle, content,
                               thumbnail_url, created_at, published_at, claps, read_time_min)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW(), NOW(), 0, $8)
            RETURNING {POST_COLUMNS}
            "#
        );

        let created = sqlx::query_as::<_, Post>(&query)
            .bind(Uuid::new_v4())
            .bind(&post.author_id)
            .bind(&post.author_name)
            .bind(&post.title)
            .bind(&post.subtitle)
            .bind(&post.content)
            .bind(&post.thumbnail_url)
            .bind(post.read_time_min())
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    async fn find_post(&self, post_id: Uuid) -> ServiceResult<Option<Post>> {
        let query = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");

        let post = sqlx::query_as::<_, Post>(&query)
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(post)
    }

    async fn find_posts(&self, post_ids: &[Uuid]) -> ServiceResult<Vec<Post>> {
        if post_ids.is_empty() {
            return Ok(vec![]);
        }

        let query = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ANY($1)");

        let posts = sqlx::query_as::<_, Post>(&query)
            .bind(post_ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(posts)
    }

    async fn list_recent_posts(&self, limit: i64) -> ServiceResult<Vec<Post>> {
        let query = format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            "#
        );

        let posts = sqlx::query_as::<_, Post>(&query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(posts)
    }

    async fn list_posts_by_author(&self, author_id: &str, limit: i64) -> ServiceResult<Vec<Post>> {
        let query = format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts
            WHERE author_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#
        );

        let posts = sqlx::query_as::<_, Post>(&query)
            .bind(author_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(posts)
    }

    async fn add_claps(&self, post_id: Uuid, delta: i64) -> ServiceResult<Option<i64>> {
        let claps: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE posts
            SET claps = GREATEST(claps + $2, 0)
            WHERE id = $1
            RETURNING claps
            "#,
        )
        .bind(post_id)
        .bind(delta)
        .fetch_optional(&self.pool)
        .await?;

        Ok(claps)
    }
}
