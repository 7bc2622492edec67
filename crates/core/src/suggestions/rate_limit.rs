//! Per-credential throttling and circuit state for the external endpoint.
//!
//! Buckets are keyed by a SHA-256 fingerprint of the credential so the raw
//! secret never becomes a map key or a log field. Each bucket tracks the
//! calls made in the rolling window, an optional cool-down deadline set after
//! a 429, and a sticky "unavailable" flag set after a 404.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};

use super::{DEFAULT_COOLDOWN_SECS, DEFAULT_RATE_LIMIT_MAX_CALLS, DEFAULT_RATE_LIMIT_WINDOW_SECS};
use crate::clock::Clock;

pub fn credential_fingerprint(credential: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(credential.as_bytes());
    format!("sha256:{:x}", hasher.finalize())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimiterSettings {
    pub max_calls: usize,
    pub window: Duration,
    pub cooldown: Duration,
}

impl Default for RateLimiterSettings {
    fn default() -> Self {
        Self {
            max_calls: DEFAULT_RATE_LIMIT_MAX_CALLS,
            window: Duration::seconds(DEFAULT_RATE_LIMIT_WINDOW_SECS as i64),
            cooldown: Duration::seconds(DEFAULT_COOLDOWN_SECS as i64),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    /// The call was recorded against the window and may proceed.
    Allowed { remaining: usize },
    Limited,
    CoolingDown { until: DateTime<Utc> },
    Unavailable,
}

#[derive(Debug, Default)]
struct Bucket {
    calls: VecDeque<DateTime<Utc>>,
    cooldown_until: Option<DateTime<Utc>>,
    unavailable: bool,
}

impl Bucket {
    fn prune(&mut self, now: DateTime<Utc>, window: Duration) {
        let window_start = now - window;
        while self.calls.front().is_some_and(|&at| at <= window_start) {
            self.calls.pop_front();
        }
    }
}

pub struct RateLimiter {
    settings: RateLimiterSettings,
    clock: Arc<dyn Clock>,
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl RateLimiter {
    pub fn new(settings: RateLimiterSettings, clock: Arc<dyn Clock>) -> Self {
        Self { settings, clock, buckets: Mutex::new(HashMap::new()) }
    }

    pub fn settings(&self) -> RateLimiterSettings {
        self.settings
    }

    /// Checks the circuit state and the rolling window, recording the call
    /// only when it is allowed.
    pub fn admit(&self, fingerprint: &str) -> Admission {
        let now = self.clock.now();
        let mut buckets = self.buckets();
        let bucket = buckets.entry(fingerprint.to_string()).or_default();

        if bucket.unavailable {
            return Admission::Unavailable;
        }
        if let Some(until) = bucket.cooldown_until {
            if now < until {
                return Admission::CoolingDown { until };
            }
            bucket.cooldown_until = None;
        }

        bucket.prune(now, self.settings.window);
        if bucket.calls.len() >= self.settings.max_calls {
            return Admission::Limited;
        }
        bucket.calls.push_back(now);
        Admission::Allowed { remaining: self.settings.max_calls - bucket.calls.len() }
    }

    /// Starts a cool-down of the configured length, or `retry_after` when the
    /// endpoint asked for longer. Returns the deadline.
    pub fn trip_cooldown(&self, fingerprint: &str, retry_after: Option<Duration>) -> DateTime<Utc> {
        let pause = retry_after
            .filter(|requested| *requested > self.settings.cooldown)
            .unwrap_or(self.settings.cooldown);
        let until = self.clock.now() + pause;
        self.buckets().entry(fingerprint.to_string()).or_default().cooldown_until = Some(until);
        until
    }

    /// Returns true when the flag was newly raised.
    pub fn mark_unavailable(&self, fingerprint: &str) -> bool {
        let mut buckets = self.buckets();
        let bucket = buckets.entry(fingerprint.to_string()).or_default();
        !std::mem::replace(&mut bucket.unavailable, true)
    }

    pub fn is_unavailable(&self, fingerprint: &str) -> bool {
        self.buckets().get(fingerprint).is_some_and(|bucket| bucket.unavailable)
    }

    /// Clears the cool-down, the unavailable flag and the call history.
    pub fn reset(&self, fingerprint: &str) {
        self.buckets().remove(fingerprint);
    }

    pub fn reset_all(&self) {
        self.buckets().clear();
    }

    fn buckets(&self) -> MutexGuard<'_, HashMap<String, Bucket>> {
        match self.buckets.lock() {
            Ok(buckets) => buckets,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
