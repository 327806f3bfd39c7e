use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use crate::domain::UserId;

// ============== Authorization ==============

/// An empty allow-list leaves the bot open to everyone.
pub fn is_authorized(user_id: Option<UserId>, allowed_users: &[i64]) -> bool {
    if allowed_users.is_empty() {
        return true;
    }
    let Some(user_id) = user_id else {
        return false;
    };
    allowed_users.contains(&user_id.0)
}

// ============== Rate Limiter (Token Bucket) ==============

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RateLimit {
    Allowed,
    Limited { retry_after: Duration },
}

#[derive(Clone, Debug)]
struct Bucket {
    tokens: f64,
    last_update: Instant,
}

/// Per-user token bucket guarding the message queue against floods.
///
/// Buckets that have refilled completely are dropped once per window, so the
/// map only holds users active within roughly the last window.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    enabled: bool,
    max_tokens: f64,
    refill_per_sec: f64,
    window: Duration,
    last_prune: Option<Instant>,
    buckets: HashMap<UserId, Bucket>,
}

impl RateLimiter {
    pub fn new(enabled: bool, max_tokens: u32, window: Duration) -> Self {
        let max_tokens_f = f64::from(max_tokens);
        let window_secs = window.as_secs_f64().max(1e-9);

        Self {
            enabled,
            max_tokens: max_tokens_f,
            refill_per_sec: max_tokens_f / window_secs,
            window,
            last_prune: None,
            buckets: HashMap::new(),
        }
    }

    pub fn check(&mut self, user_id: UserId) -> RateLimit {
        self.check_at(user_id, Instant::now())
    }

    pub fn check_at(&mut self, user_id: UserId, now: Instant) -> RateLimit {
        if !self.enabled {
            return RateLimit::Allowed;
        }

        self.prune_at(now);

        let bucket = self.buckets.entry(user_id).or_insert_with(|| Bucket {
            tokens: self.max_tokens,
            last_update: now,
        });

        let elapsed = now.duration_since(bucket.last_update).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.refill_per_sec).min(self.max_tokens);
        bucket.last_update = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            return RateLimit::Allowed;
        }

        if self.refill_per_sec <= 0.0 {
            return RateLimit::Limited {
                retry_after: Duration::MAX,
            };
        }
        let secs = (1.0 - bucket.tokens) / self.refill_per_sec;
        RateLimit::Limited {
            retry_after: Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::MAX),
        }
    }

    fn prune_at(&mut self, now: Instant) {
        let due = match self.last_prune {
            None => {
                self.last_prune = Some(now);
                false
            }
            Some(last) => now.saturating_duration_since(last) >= self.window,
        };
        if !due {
            return;
        }
        self.last_prune = Some(now);

        let (max, refill) = (self.max_tokens, self.refill_per_sec);
        self.buckets.retain(|_, b| {
            let elapsed = now.saturating_duration_since(b.last_update).as_secs_f64();
            b.tokens + elapsed * refill < max
        });
    }
}
