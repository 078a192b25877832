use super::RateLimitStore;
use crate::error::ServiceResult;
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Minimum spacing between sweeps of idle keys.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug)]
struct SlidingLog {
    window: Duration,
    hits: VecDeque<Instant>,
}

impl SlidingLog {
    fn is_idle(&self, now: Instant) -> bool {
        self.hits
            .back()
            .map(|newest| now.duration_since(*newest) >= self.window)
            .unwrap_or(true)
    }
}

/// Process-local sliding log. The per-key entry lock makes trim, count and
/// push one atomic step. Keys whose newest hit has left its window are
/// swept at most once per [`SWEEP_INTERVAL`].
pub struct InMemoryRateLimitStore {
    logs: DashMap<String, SlidingLog>,
    last_sweep: Mutex<Instant>,
}

impl Default for InMemoryRateLimitStore {
    fn default() -> Self {
        Self {
            logs: DashMap::new(),
            last_sweep: Mutex::new(Instant::now()),
        }
    }
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sweep_idle(&self, now: Instant) {
        // A contended or poisoned lock means another caller is sweeping
        let Ok(mut last_sweep) = self.last_sweep.try_lock() else {
            return;
        };
        if now.duration_since(*last_sweep) < SWEEP_INTERVAL {
            return;
        }
        *last_sweep = now;
        drop(last_sweep);

        self.logs.retain(|_, log| !log.is_idle(now));
    }

    #[cfg(test)]
    fn tracked_keys(&self) -> usize {
        self.logs.len()
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimitStore {
    async fn increment_and_check(
        &self,
        key: &str,
        limit: u32,
        window: Duration,
    ) -> ServiceResult<bool> {
        let now = Instant::now();
        self.sweep_idle(now);

        if limit == 0 {
            return Ok(false);
        }

        let mut log = self
            .logs
            .entry(key.to_string())
            .or_insert_with(|| SlidingLog {
                window,
                hits: VecDeque::new(),
            });
        log.window = window;

        while let Some(oldest) = log.hits.front() {
            if now.duration_since(*oldest) >= window {
                log.hits.pop_front();
            } else {
                break;
            }
        }

        if log.hits.len() < limit as usize {
            log.hits.push_back(now);
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
