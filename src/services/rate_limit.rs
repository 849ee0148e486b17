use lru::LruCache;
use serde::Serialize;
use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Outcome of a rate-limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Blocked { retry_after: Duration },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed)
    }
}

#[derive(Debug, Default)]
struct ClientWindow {
    requests: VecDeque<Instant>,
    blocked_until: Option<Instant>,
}

/// Per-client view for diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct ClientStats {
    pub client: String,
    pub recent_requests: usize,
    pub is_blocked: bool,
}

/// Sliding-window rate limiter keyed by client identifier
///
/// A client making more than `max_requests` calls within `window` is blocked
/// for `block`. Only the most recently seen `tracked_clients` are remembered.
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    block: Duration,
    clients: Mutex<LruCache<String, ClientWindow>>,
}

impl RateLimiter {
    pub fn new(
        max_requests: usize,
        window: Duration,
        block: Duration,
        tracked_clients: usize,
    ) -> Self {
        let capacity = NonZeroUsize::new(tracked_clients).unwrap_or(NonZeroUsize::MIN);
        Self {
            max_requests,
            window,
            block,
            clients: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Record a request from `client` and decide whether to serve it
    pub fn check(&self, client: &str) -> RateDecision {
        self.check_at(client, Instant::now())
    }

    pub fn check_at(&self, client: &str, now: Instant) -> RateDecision {
        let mut clients = self.lock();
        let state = clients.get_or_insert_mut(client.to_string(), ClientWindow::default);

        if let Some(until) = state.blocked_until {
            if now < until {
                return RateDecision::Blocked {
                    retry_after: until - now,
                };
            }
            state.blocked_until = None;
            state.requests.clear();
        }

        while let Some(front) = state.requests.front() {
            if now.saturating_duration_since(*front) >= self.window {
                state.requests.pop_front();
            } else {
                break;
            }
        }

        state.requests.push_back(now);

        if state.requests.len() > self.max_requests {
            state.blocked_until = Some(now + self.block);
            tracing::warn!(
                "Rate limit exceeded for {} ({} requests in {:?}), blocking for {:?}",
                client,
                state.requests.len(),
                self.window,
                self.block
            );
            return RateDecision::Blocked {
                retry_after: self.block,
            };
        }

        RateDecision::Allowed
    }

    /// Diagnostics for one client
    pub fn stats(&self, client: &str) -> ClientStats {
        let now = Instant::now();
        let mut clients = self.lock();
        let (recent_requests, is_blocked) = clients
            .get(client)
            .map(|state| {
                let recent = state
                    .requests
                    .iter()
                    .filter(|t| now.saturating_duration_since(**t) < self.window)
                    .count();
                let blocked = state.blocked_until.is_some_and(|until| now < until);
                (recent, blocked)
            })
            .unwrap_or((0, false));

        ClientStats {
            client: client.to_string(),
            recent_requests,
            is_blocked,
        }
    }

    pub fn tracked_clients(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, ClientWindow>> {
        // State is a plain counter; a panic mid-update cannot corrupt it
        self.clients.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max: usize) -> RateLimiter {
        RateLimiter::new(max, Duration::from_secs(60), Duration::from_secs(300), 16)
    }

    #[test]
    fn test_allows_up_to_limit() {
        let limiter = limiter(3);
        let now = Instant::now();

        for _ in 0..3 {
            assert!(limiter.check_at("1.2.3.4", now).is_allowed());
        }
        assert_eq!(
            limiter.check_at("1.2.3.4", now),
            RateDecision::Blocked {
                retry_after: Duration::from_secs(300)
            }
        );
        // Other clients are unaffected
        assert!(limiter.check_at("5.6.7.8", now).is_allowed());
    }

    #[test]
    fn test_block_expires() {
        let limiter = limiter(1);
        let start = Instant::now();

        assert!(limiter.check_at("c", start).is_allowed());
        assert!(!limiter.check_at("c", start).is_allowed());

        let during = start + Duration::from_secs(100);
        match limiter.check_at("c", during) {
            RateDecision::Blocked { retry_after } => {
                assert_eq!(retry_after, Duration::from_secs(200))
            }
            RateDecision::Allowed => panic!("expected block"),
        }

        let after = start + Duration::from_secs(301);
        assert!(limiter.check_at("c", after).is_allowed());
    }

    #[test]
    fn test_window_slides() {
        let limiter = limiter(2);
        let start = Instant::now();

        assert!(limiter.check_at("c", start).is_allowed());
        assert!(limiter.check_at("c", start + Duration::from_secs(30)).is_allowed());
        // First request has left the window
        assert!(limiter.check_at("c", start + Duration::from_secs(61)).is_allowed());
    }

    #[test]
    fn test_tracked_clients_bounded() {
        let limiter = RateLimiter::new(10, Duration::from_secs(60), Duration::from_secs(60), 2);
        limiter.check("a");
        limiter.check("b");
        limiter.check("c");
        assert_eq!(limiter.tracked_clients(), 2);
    }

    #[test]
    fn test_stats() {
        let limiter = limiter(1);
        limiter.check("c");
        limiter.check("c");

        let stats = limiter.stats("c");
        assert_eq!(stats.recent_requests, 2);
        assert!(stats.is_blocked);
        assert_eq!(limiter.stats("unknown").recent_requests, 0);
    }
}
