use crate::config::{RateLimitConfig, SocialConfig};
use crate::identity::{IdentityDirectory, IdentityResolver};
use crate::rate_limit::{RateLimitStore, RateLimiter};
use crate::repository::{
    CommentRepository, FollowRepository, InMemoryStore, PgCommentRepository, PgFollowRepository,
    PgPostRepository, PgSavedPostRepository, PostRepository, SavedPostRepository,
};
use crate::services::{AggregationFacade, ContentStore, EngagementLedger, SocialGraphLedger};
use sqlx::PgPool;
use std::sync::Arc;

/// Repository handles for every durable entity
#[derive(Clone)]
pub struct Stores {
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub saved: Arc<dyn SavedPostRepository>,
    pub follows: Arc<dyn FollowRepository>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            posts: Arc::new(PgPostRepository::new(pool.clone())),
            comments: Arc::new(PgCommentRepository::new(pool.clone())),
            saved: Arc::new(PgSavedPostRepository::new(pool.clone())),
            follows: Arc::new(PgFollowRepository::new(pool)),
        }
    }

    /// All four repositories backed by one shared in-process store
    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self {
            posts: store.clone(),
            comments: store.clone(),
            saved: store.clone(),
            follows: store,
        }
    }
}

/// Fully wired components. Cheap to clone; holds no per-request state.
#[derive(Clone)]
pub struct AppState {
    pub identities: IdentityResolver,
    pub content: ContentStore,
    pub engagement: EngagementLedger,
    pub social: SocialGraphLedger,
    pub limiter: RateLimiter,
    pub facade: AggregationFacade,
}

impl AppState {
    pub fn new(
        stores: Stores,
        directory: Arc<dyn IdentityDirectory>,
        rate_limit_store: Arc<dyn RateLimitStore>,
        rate_limit: RateLimitConfig,
        social: &SocialConfig,
    ) -> Self {
        let identities = IdentityResolver::new(directory);
        let content = ContentStore::new(stores.posts, stores.comments);
        let engagement = EngagementLedger::new(content.clone(), stores.saved, identities.clone());
        let social = SocialGraphLedger::new(stores.follows, identities.clone())
            .with_followee_verification(social.verify_followee);
        let limiter = RateLimiter::new(rate_limit_store, rate_limit);
        let facade = AggregationFacade::new(
            content.clone(),
            identities.clone(),
            limiter.clone(),
            engagement.clone(),
            social.clone(),
        );

        Self {
            identities,
            content,
            engagement,
            social,
            limiter,
            facade,
        }
    }
}
