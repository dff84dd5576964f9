//! IP reputation tracking with escalating blacklisting.
//!
//! Each identity accumulates a weighted attempt count that decays to zero
//! once the identity has been quiet for the reputation window. Reaching the
//! block threshold puts the identity on a blacklist that only an explicit
//! [`IpReputationTracker::unblock`] clears.

use crate::clock::Clock;
use crate::config::ReputationConfig;
use crate::eviction::evict_sampled;
use dashmap::{DashMap, DashSet};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Weighted attempt count for one identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// Weighted attempts inside the current window
    pub count: u32,
    /// Time of the last attempt (ms since epoch)
    pub last_attempt_at: u64,
}

/// Aggregate view of reputation state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationStats {
    /// Identities on the blacklist
    pub blocked_count: usize,
    /// Identities between the suspicious and block thresholds
    pub suspicious_count: usize,
}

/// Escalating attempt counter and blacklist.
pub struct IpReputationTracker {
    records: DashMap<String, AttemptRecord>,
    blacklist: DashSet<String>,
    config: ReputationConfig,
    window_ms: u64,
    clock: Arc<dyn Clock>,
}

impl IpReputationTracker {
    /// Create a tracker from configuration.
    pub fn new(config: ReputationConfig, clock: Arc<dyn Clock>) -> Self {
        let window_ms = config.window().as_millis() as u64;
        Self {
            records: DashMap::new(),
            blacklist: DashSet::new(),
            config,
            window_ms,
            clock,
        }
    }

    /// True if the identity is blacklisted.
    pub fn is_blocked(&self, identity: &str) -> bool {
        self.blacklist.contains(identity)
    }

    /// Record an attempt; violations weigh more than neutral attempts.
    pub fn record_attempt(&self, identity: &str, is_violation: bool) {
        let now = self.clock.now_ms();
        let weight = if is_violation {
            self.config.violation_weight
        } else {
            self.config.attempt_weight
        };

        self.make_room(identity);

        let count = {
            let mut record = self
                .records
                .entry(identity.to_string())
                .or_insert(AttemptRecord {
                    count: 0,
                    last_attempt_at: now,
                });

            if now.saturating_sub(record.last_attempt_at) > self.window_ms {
                record.count = 0;
            }
            record.count = record.count.saturating_add(weight);
            record.last_attempt_at = record.last_attempt_at.max(now);
            record.count
        };

        if count >= self.config.block_threshold && self.blacklist.insert(identity.to_string()) {
            warn!(
                identity = %identity,
                count,
                threshold = self.config.block_threshold,
                "Identity blacklisted after repeated violations"
            );
        }
    }

    /// Remove an identity from the blacklist and clear its record.
    ///
    /// Returns true if there was anything to clear.
    pub fn unblock(&self, identity: &str) -> bool {
        let was_blocked = self.blacklist.remove(identity).is_some();
        let had_record = self.records.remove(identity).is_some();
        if was_blocked {
            info!(identity = %identity, "Identity removed from blacklist");
        }
        was_blocked || had_record
    }

    /// Current weighted count, honouring decay.
    pub fn attempt_count(&self, identity: &str) -> u32 {
        let now = self.clock.now_ms();
        self.records
            .get(identity)
            .filter(|r| now.saturating_sub(r.last_attempt_at) <= self.window_ms)
            .map_or(0, |r| r.count)
    }

    /// Sorted snapshot of blacklisted identities.
    pub fn blacklisted(&self) -> Vec<String> {
        let mut list: Vec<String> = self.blacklist.iter().map(|e| e.key().clone()).collect();
        list.sort();
        list
    }

    /// Blocked and suspicious counts.
    pub fn stats(&self) -> ReputationStats {
        let now = self.clock.now_ms();
        let suspicious_count = self
            .records
            .iter()
            .filter(|r| now.saturating_sub(r.last_attempt_at) <= self.window_ms)
            .filter(|r| {
                r.count >= self.config.suspicious_threshold && r.count < self.config.block_threshold
            })
            .count();

        ReputationStats {
            blocked_count: self.blacklist.len(),
            suspicious_count,
        }
    }

    /// Drop records that have decayed. Blacklist membership is untouched.
    pub fn prune_expired(&self) -> usize {
        let now = self.clock.now_ms();
        let before = self.records.len();
        self.records
            .retain(|_, r| now.saturating_sub(r.last_attempt_at) <= self.window_ms);
        before.saturating_sub(self.records.len())
    }

    /// Evict the stalest record when the map is full.
    fn make_room(&self, identity: &str) {
        if self.records.len() < self.config.max_tracked_identities.max(1)
            || self.records.contains_key(identity)
        {
            return;
        }

        evict_sampled(&self.records, |record| record.last_attempt_at);
    }
}
