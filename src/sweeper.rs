//! Background sweep of expired state.
//!
//! Requests only prune the keys they touch. The sweeper walks every key on an
//! interval so identities that stop sending requests are eventually dropped.

use crate::guard::ThreatDetectionOrchestrator;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Spawn a task that prunes `guard` every `interval`.
///
/// The task runs until the returned handle is aborted or the runtime shuts down.
pub fn spawn_sweeper(guard: Arc<ThreatDetectionOrchestrator>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; skip it so the first sweep waits a full interval.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let report = guard.prune_expired();
            debug!(
                frequency_windows = report.frequency_windows,
                attempt_records = report.attempt_records,
                csrf_tokens = report.csrf_tokens,
                tracked_identities = guard.limiter().tracked_identities(),
                "Expired state swept"
            );
        }
    })
}

/// Spawn the sweeper if the guard's configuration enables it.
pub fn spawn_configured(guard: &Arc<ThreatDetectionOrchestrator>) -> Option<JoinHandle<()>> {
    let sweep = &guard.config().sweep;
    if !sweep.enabled {
        return None;
    }
    let interval = sweep.interval();
    Some(spawn_sweeper(Arc::clone(guard), interval))
}
