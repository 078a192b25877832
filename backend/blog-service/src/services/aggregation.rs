//! Aggregation facade - read models for the presentation layer and the gated write path.
//!
//! Every composition resolves the distinct author set with exactly one
//! directory call. A single unresolved author fails the whole composition.

use super::{
    distinct_ids, join_authors, ContentStore, EngagementLedger, JoinPolicy, SocialGraphLedger,
    MAX_LIST_LIMIT,
};
use crate::domain::{Comment, CommentWithAvatar, NewPost, Post, PostDetail, PostWithAuthor};
use crate::error::{ServiceError, ServiceResult};
use crate::identity::IdentityResolver;
use crate::rate_limit::RateLimiter;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct AggregationFacade {
    content: ContentStore,
    identities: IdentityResolver,
    limiter: RateLimiter,
    engagement: EngagementLedger,
    social: SocialGraphLedger,
}

impl AggregationFacade {
    pub fn new(
        content: ContentStore,
        identities: IdentityResolver,
        limiter: RateLimiter,
        engagement: EngagementLedger,
        social: SocialGraphLedger,
    ) -> Self {
        Self {
            content,
            identities,
            limiter,
            engagement,
            social,
        }
    }

    pub async fn compose_posts_with_authors(
        &self,
        posts: Vec<Post>,
    ) -> ServiceResult<Vec<PostWithAuthor>> {
        let author_ids = distinct_ids(posts.iter().map(|p| p.author_id.as_str()));
        let resolved = self.identities.resolve_batch(&author_ids).await?;

        let joined = join_authors(posts, |p| p.author_id.as_str(), &resolved, JoinPolicy::Strict)?;
        Ok(joined
            .into_iter()
            .map(|(post, author)| PostWithAuthor { post, author })
            .collect())
    }

    pub async fn compose_comments_with_avatars(
        &self,
        comments: Vec<Comment>,
    ) -> ServiceResult<Vec<CommentWithAvatar>> {
        let author_ids = distinct_ids(comments.iter().map(|c| c.author_id.as_str()));
        let resolved = self.identities.resolve_batch(&author_ids).await?;

        let joined = join_authors(
            comments,
            |c| c.author_id.as_str(),
            &resolved,
            JoinPolicy::Strict,
        )?;
        Ok(joined
            .into_iter()
            .map(|(comment, author)| CommentWithAvatar {
                comment,
                author_avatar_url: author.profile_picture_url,
            })
            .collect())
    }

    /// Create a post if the author is inside the sliding-window limit.
    ///
    /// Input is validated first so malformed requests do not consume a slot.
    pub async fn create_post_gated(&self, new_post: NewPost) -> ServiceResult<Post> {
        new_post.validate()?;

        let author_id = new_post.author_id.clone();
        if !self.limiter.allow(&author_id).await? {
            let config = self.limiter.config();
            warn!(author_id = %author_id, "post creation rate limited");
            return Err(ServiceError::RateLimited {
                key: author_id,
                limit: config.max_requests,
                window_seconds: config.window_seconds,
            });
        }

        let post = self.content.create_post(new_post).await?;
        info!(post_id = %post.id, author_id = %post.author_id, "gated post creation succeeded");
        Ok(post)
    }

    /// Newest posts with authors
    pub async fn recent_feed(&self) -> ServiceResult<Vec<PostWithAuthor>> {
        let posts = self.content.list_recent(MAX_LIST_LIMIT).await?;
        self.compose_posts_with_authors(posts).await
    }

    /// An author's posts with the author attached
    pub async fn author_feed(&self, author_id: &str) -> ServiceResult<Vec<PostWithAuthor>> {
        let posts = self.content.list_by_author(author_id, MAX_LIST_LIMIT).await?;
        self.compose_posts_with_authors(posts).await
    }

    /// Post page: post, author, author's follow stats and the viewer's saved flag
    pub async fn post_detail(&self, post_id: Uuid, viewer_id: Option<&str>) -> ServiceResult<PostDetail> {
        let post = self.content.get_by_id(post_id).await?;
        let mut composed = self.compose_posts_with_authors(vec![post]).await?;
        let PostWithAuthor { post, author } = composed
            .pop()
            .ok_or_else(|| ServiceError::NotFound(format!("post {}", post_id)))?;

        let author_stats = self.social.get_follow_stats(&post.author_id).await?;
        let saved_by_viewer = match viewer_id {
            Some(viewer) => Some(self.engagement.is_saved(viewer, post.id).await?),
            None => None,
        };

        Ok(PostDetail {
            post,
            author,
            author_stats,
            saved_by_viewer,
        })
    }

    /// Comments on a post with commenter avatars, newest first
    pub async fn comments_for_post(&self, post_id: Uuid) -> ServiceResult<Vec<CommentWithAvatar>> {
        let comments = self.content.list_comments_by_post(post_id).await?;
        self.compose_comments_with_avatars(comments).await
    }

    /// A user's saved posts with authors; a missing author fails the listing
    pub async fn saved_posts_with_authors(&self, user_id: &str) -> ServiceResult<Vec<PostWithAuthor>> {
        let saved = self
            .engagement
            .list_saved_by_user(user_id, JoinPolicy::Strict)
            .await?;

        Ok(saved
            .into_iter()
            .map(|(post, author)| PostWithAuthor { post, author })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RateLimitConfig, SocialConfig};
    use crate::identity::{DirectoryUser, MockIdentityDirectory};
    use crate::rate_limit::InMemoryRateLimitStore;
    use crate::state::{AppState, Stores};
    use std::sync::Arc;

    fn directory_user(id: &str) -> DirectoryUser {
        DirectoryUser {
            id: id.to_string(),
            username: Some(format!("{}_name", id)),
            first_name: None,
            image_url: format!("https://img.example.com/{}.png", id),
        }
    }

    fn new_post(author: &str, title: &str) -> NewPost {
        NewPost {
            author_id: author.to_string(),
            author_name: author.to_string(),
            title: title.to_string(),
            subtitle: None,
            content: "body".to_string(),
            thumbnail_url: None,
        }
    }

    fn state(directory: MockIdentityDirectory) -> AppState {
        AppState::new(
            Stores::in_memory(),
            Arc::new(directory),
            Arc::new(InMemoryRateLimitStore::new()),
            RateLimitConfig::default(),
            &SocialConfig {
                verify_followee: false,
            },
        )
    }

    #[tokio::test]
    async fn test_compose_posts_issues_one_batch_lookup() {
        let mut directory = MockIdentityDirectory::new();
        directory
            .expect_lookup_by_ids()
            .withf(|ids| ids.len() == 2 && ids[0] == "A" && ids[1] == "B")
            .times(1)
            .returning(|_| Ok(vec![directory_user("A"), directory_user("B")]));

        let state = state(directory);
        let p1 = state.content.create_post(new_post("A", "P1")).await.unwrap();
        let p2 = state.content.create_post(new_post("A", "P2")).await.unwrap();
        let p3 = state.content.create_post(new_post("B", "P3")).await.unwrap();

        let composed = state
            .facade
            .compose_posts_with_authors(vec![p1, p2, p3])
            .await
            .unwrap();

        let pairs: Vec<_> = composed
            .iter()
            .map(|c| (c.post.title.as_str(), c.author.username.as_str()))
            .collect();
        assert_eq!(pairs, vec![("P1", "A_name"), ("P2", "A_name"), ("P3", "B_name")]);
    }

    #[tokio::test]
    async fn test_compose_fails_whole_batch_on_missing_author() {
        let mut directory = MockIdentityDirectory::new();
        directory
            .expect_lookup_by_ids()
            .times(1)
            .returning(|_| Ok(vec![directory_user("A")]));

        let state = state(directory);
        let p1 = state.content.create_post(new_post("A", "P1")).await.unwrap();
        let p2 = state.content.create_post(new_post("ghost", "P2")).await.unwrap();

        let err = state
            .facade
            .compose_posts_with_authors(vec![p1, p2])
            .await
            .unwrap_err();
        match err {
            ServiceError::JoinInconsistency { missing } => assert_eq!(missing, vec!["ghost"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_compose_empty_input_skips_directory() {
        let mut directory = MockIdentityDirectory::new();
        directory.expect_lookup_by_ids().never();

        let state = state(directory);
        assert!(state
            .facade
            .compose_comments_with_avatars(Vec::new())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_invalid_post_does_not_consume_rate_limit_slot() {
        let state = state(MockIdentityDirectory::new());

        for _ in 0..5 {
            let err = state
                .facade
                .create_post_gated(new_post("A", ""))
                .await
                .unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)));
        }

        assert!(state.facade.create_post_gated(new_post("A", "ok")).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_gated_create_rejects_fourth_post_in_window() {
        let state = state(MockIdentityDirectory::new());

        for i in 0..3 {
            state
                .facade
                .create_post_gated(new_post("A", &format!("P{}", i)))
                .await
                .unwrap();
        }

        match state.facade.create_post_gated(new_post("A", "P3")).await {
            Err(ServiceError::RateLimited {
                key,
                limit,
                window_seconds,
            }) => {
                assert_eq!(key, "A");
                assert_eq!(limit, 3);
                assert_eq!(window_seconds, 60);
            }
            other => panic!("expected rate limit, got {other:?}"),
        }

        // Other authors have their own window
        assert!(state.facade.create_post_gated(new_post("B", "B1")).await.is_ok());

        tokio::time::advance(std::time::Duration::from_secs(61)).await;
        assert!(state.facade.create_post_gated(new_post("A", "P4")).await.is_ok());
        assert_eq!(state.content.list_by_author("A", 100).await.unwrap().len(), 4);
    }
}
