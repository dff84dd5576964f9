//! Sliding-window request frequency limiter.
//!
//! Tracks, per identity, the timestamps of recent requests inside a trailing
//! window and answers whether the identity is still within its cap.

use crate::clock::Clock;
use crate::config::LimiterConfig;
use crate::eviction::evict_sampled;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// Request timestamps for one identity, oldest first.
#[derive(Debug, Default)]
struct FrequencyWindow {
    timestamps: VecDeque<u64>,
}

impl FrequencyWindow {
    /// Drop timestamps older than the window.
    fn prune(&mut self, now: u64, window_ms: u64) {
        while let Some(&oldest) = self.timestamps.front() {
            if now.saturating_sub(oldest) > window_ms {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    /// Append `now`, clamped so the sequence stays non-decreasing.
    fn push(&mut self, now: u64, capacity: usize) -> u64 {
        let now = self.timestamps.back().map_or(now, |&last| now.max(last));
        if self.timestamps.len() >= capacity {
            self.timestamps.pop_front();
        }
        self.timestamps.push_back(now);
        now
    }

    fn last_seen(&self) -> Option<u64> {
        self.timestamps.back().copied()
    }
}

/// Per-identity sliding-window limiter.
pub struct RequestFrequencyLimiter {
    windows: DashMap<String, FrequencyWindow>,
    window_ms: u64,
    max_requests: u32,
    max_identities: usize,
    clock: Arc<dyn Clock>,
}

impl RequestFrequencyLimiter {
    /// Create a limiter from configuration.
    pub fn new(config: &LimiterConfig, clock: Arc<dyn Clock>) -> Self {
        Self::with_limits(config.window(), config.max_requests, config.max_tracked_identities, clock)
    }

    /// Create a limiter with explicit limits.
    pub fn with_limits(
        window: Duration,
        max_requests: u32,
        max_identities: usize,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            windows: DashMap::new(),
            window_ms: window.as_millis() as u64,
            max_requests,
            max_identities: max_identities.max(1),
            clock,
        }
    }

    /// Timestamps kept per identity; one past the cap is enough to decide.
    fn capacity(&self) -> usize {
        self.max_requests as usize + 1
    }

    /// Evict one idle identity when the map is full.
    fn make_room(&self, identity: &str) {
        if self.windows.len() < self.max_identities || self.windows.contains_key(identity) {
            return;
        }
        evict_sampled(&self.windows, |window| window.last_seen().unwrap_or(0));
    }

    /// Record a request and report whether it is within the cap.
    pub fn record(&self, identity: &str) -> bool {
        let now = self.clock.now_ms();
        self.make_room(identity);

        let capacity = self.capacity();
        let mut window = self.windows.entry(identity.to_string()).or_default();
        let now = window.push(now, capacity);
        window.prune(now, self.window_ms);

        window.timestamps.len() <= self.max_requests as usize
    }

    /// Requests currently inside the window, without recording one.
    ///
    /// Saturates at `max_requests + 1`.
    pub fn count(&self, identity: &str) -> usize {
        let now = self.clock.now_ms();
        match self.windows.get_mut(identity) {
            Some(mut window) => {
                window.prune(now, self.window_ms);
                window.timestamps.len()
            }
            None => 0,
        }
    }

    /// Forget an identity.
    pub fn reset(&self, identity: &str) {
        self.windows.remove(identity);
    }

    /// Number of identities currently tracked.
    pub fn tracked_identities(&self) -> usize {
        self.windows.len()
    }

    /// Remove identities with no requests left inside the window.
    pub fn prune_expired(&self) -> usize {
        let now = self.clock.now_ms();
        let before = self.windows.len();
        self.windows.retain(|_, window| {
            window.prune(now, self.window_ms);
            !window.timestamps.is_empty()
        });
        before.saturating_sub(self.windows.len())
    }
}
