//! Sliding-window throttling of API writes, one window per owner and route template.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed { remaining: u32 },
    Throttled { retry_after: Duration },
}

#[derive(Debug, Clone)]
pub struct ApiRateLimiter {
    window: Duration,
    max_requests: u32,
    hits: Arc<DashMap<(String, String), VecDeque<Instant>>>,
}

impl ApiRateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            hits: Arc::new(DashMap::new()),
        }
    }

    /// Count a request by `owner` against `route`, or say how long to wait.
    pub fn admit(&self, owner: &str, route: &str) -> Admission {
        self.admit_at(owner, route, Instant::now())
    }

    fn admit_at(&self, owner: &str, route: &str, now: Instant) -> Admission {
        let mut hits = self
            .hits
            .entry((owner.to_string(), route.to_string()))
            .or_default();
        while hits
            .front()
            .is_some_and(|hit| now.duration_since(*hit) >= self.window)
        {
            hits.pop_front();
        }

        if hits.len() >= self.max_requests as usize {
            let oldest = hits.front().copied().unwrap_or(now);
            let retry_after = self.window.saturating_sub(now.duration_since(oldest));
            return Admission::Throttled { retry_after };
        }

        hits.push_back(now);
        Admission::Allowed {
            remaining: self.max_requests.saturating_sub(hits.len() as u32),
        }
    }

    pub fn limit(&self) -> u32 {
        self.max_requests
    }
}
