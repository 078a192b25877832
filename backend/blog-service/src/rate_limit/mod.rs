//! Sliding-window admission control keyed by identity id.
//!
//! The limiter holds no counters itself; it delegates to a [`RateLimitStore`]
//! whose `increment_and_check` is atomic per key and independent of the
//! primary store's transactions.

pub mod memory;
pub mod redis;

use crate::config::RateLimitConfig;
use crate::error::ServiceResult;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub use self::memory::InMemoryRateLimitStore;
pub use self::redis::RedisRateLimitStore;

#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Count the events for `key` inside the trailing `window`. If fewer than
    /// `limit` were admitted, record this one and return `true`; otherwise
    /// record nothing and return `false`.
    async fn increment_and_check(&self, key: &str, limit: u32, window: Duration)
        -> ServiceResult<bool>;
}

#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>, config: RateLimitConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Admit or deny one event for `key` with the configured limit and window
    pub async fn allow(&self, key: &str) -> ServiceResult<bool> {
        self.allow_with(key, self.config.max_requests, self.config.window_seconds)
            .await
    }

    pub async fn allow_with(&self, key: &str, limit: u32, window_seconds: u64) -> ServiceResult<bool> {
        if limit == 0 {
            return Ok(false);
        }

        let store_key = self.store_key(key);
        let allowed = self
            .store
            .increment_and_check(&store_key, limit, Duration::from_secs(window_seconds))
            .await?;

        if allowed {
            debug!(key = %key, "rate limit admitted");
        } else {
            warn!(key = %key, limit, window_seconds, "rate limit exceeded");
        }

        Ok(allowed)
    }

    fn store_key(&self, key: &str) -> String {
        format!("{}:{}", self.config.key_prefix, key)
    }
}
