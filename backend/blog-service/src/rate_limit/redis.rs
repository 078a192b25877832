use super::RateLimitStore;
use crate::error::ServiceResult;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{RedisError, RedisResult, Script};
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::warn;
use uuid::Uuid;

const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_millis(100);

/// Sliding log in a sorted set: scores are admission times in milliseconds
/// taken from the Redis server clock, so every app node shares one timeline.
/// Trim, count and conditional add run as one script, so concurrent callers
/// for the same key cannot both take the last slot.
const SLIDING_WINDOW_SCRIPT: &str = r#"
    if redis.replicate_commands then redis.replicate_commands() end

    local key = KEYS[1]
    local window = tonumber(ARGV[1])
    local limit = tonumber(ARGV[2])
    local member = ARGV[3]

    local t = redis.call('TIME')
    local now = tonumber(t[1]) * 1000 + math.floor(tonumber(t[2]) / 1000)

    redis.call('ZREMRANGEBYSCORE', key, '-inf', now - window)
    local count = redis.call('ZCARD', key)
    if count < limit then
        redis.call('ZADD', key, now, member)
        redis.call('PEXPIRE', key, window)
        return 1
    end
    return 0
"#;

#[derive(Clone)]
pub struct RedisRateLimitStore {
    redis: ConnectionManager,
    script: Script,
    store_timeout: Duration,
}

impl RedisRateLimitStore {
    pub fn new(redis: ConnectionManager) -> Self {
        Self {
            redis,
            script: Script::new(SLIDING_WINDOW_SCRIPT),
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    /// Bound each script round trip; an expired bound is a store failure
    pub fn with_timeout(mut self, store_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self
    }
}

/// Await a Redis call for at most `bound`.
async fn bounded<T>(
    bound: Duration,
    call: impl Future<Output = RedisResult<T>>,
) -> ServiceResult<T> {
    match timeout(bound, call).await {
        Ok(result) => Ok(result?),
        Err(_) => {
            warn!(timeout_ms = bound.as_millis() as u64, "rate limit store timed out");
            Err(RedisError::from((
                redis::ErrorKind::IoError,
                "rate limit store timed out",
            ))
            .into())
        }
    }
}

#[async_trait]
impl RateLimitStore for RedisRateLimitStore {
    async fn increment_and_check(
        &self,
        key: &str,
        limit: u32,
        window: Duration,
    ) -> ServiceResult<bool> {
        // ConnectionManager clones share the underlying connection
        let mut conn = self.redis.clone();
        let window_ms = i64::try_from(window.as_millis()).unwrap_or(i64::MAX);

        let mut invocation = self.script.prepare_invoke();
        invocation
            .key(key)
            .arg(window_ms)
            .arg(limit)
            .arg(Uuid::new_v4().to_string());

        let admitted: i64 = bounded(self.store_timeout, invocation.invoke_async(&mut conn)).await?;
        Ok(admitted == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, ServiceError};

    #[tokio::test(start_paused = true)]
    async fn test_bounded_times_out_as_upstream_error() {
        let stalled = std::future::pending::<RedisResult<i64>>();

        let err = bounded(Duration::from_millis(100), stalled)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Redis(_)));
        assert_eq!(err.kind(), ErrorKind::Upstream);
    }

    #[tokio::test]
    async fn test_bounded_passes_result_through() {
        let admitted = bounded(Duration::from_millis(100), async { Ok::<i64, RedisError>(1) })
            .await
            .unwrap();
        assert_eq!(admitted, 1);
    }
}
