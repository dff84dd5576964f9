//! Offline replay of recorded form traffic.
//!
//! Input is JSON lines. Each line is either a [`FormSubmission`] or an
//! administrative `{"unblock": "<ip>"}` event. Events run in order against a
//! single orchestrator, so limiter and reputation state build up the way they
//! would under live traffic.

use crate::guard::{FormSubmission, ThreatDetectionOrchestrator};
use crate::verdict::ThreatLevel;
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, Write};
use tracing::{debug, info, warn};

/// One line of replay input.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ReplayEvent {
    /// Clear an identity from the blacklist at this point in the stream
    Unblock { unblock: String },
    /// A form submission to evaluate
    Submission(FormSubmission),
}

/// Counters for a finished replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    pub evaluated: usize,
    pub blocked: usize,
    pub unblocked: usize,
    pub skipped: usize,
}

/// Replay every line of `input`, writing one JSON record per event to `out`.
///
/// Malformed lines are logged and skipped. Only I/O failures abort.
pub fn replay<R: BufRead, W: Write>(
    guard: &ThreatDetectionOrchestrator,
    input: R,
    mut out: W,
) -> io::Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();

    for (index, line) in input.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let event: ReplayEvent = match serde_json::from_str(line) {
            Ok(event) => event,
            Err(e) => {
                warn!(line = index + 1, error = %e, "Skipping malformed replay line");
                summary.skipped += 1;
                continue;
            }
        };

        let record = match event {
            ReplayEvent::Unblock { unblock } => {
                let cleared = guard.unblock(&unblock);
                summary.unblocked += usize::from(cleared);
                serde_json::json!({ "unblock": unblock, "cleared": cleared })
            }
            ReplayEvent::Submission(submission) => {
                let verdict = guard.detect(&submission);
                summary.evaluated += 1;
                summary.blocked += usize::from(verdict.is_blocked);

                if verdict.threat_level >= ThreatLevel::Medium {
                    info!(
                        client_ip = %submission.ip,
                        score = verdict.score,
                        threat_level = %verdict.threat_level,
                        blocked = verdict.is_blocked,
                        reasons = ?verdict.reasons,
                        "Threat detected"
                    );
                } else {
                    debug!(client_ip = %submission.ip, score = verdict.score, "Submission accepted");
                }

                serde_json::json!({ "ip": submission.ip, "verdict": verdict })
            }
        };

        serde_json::to_writer(&mut out, &record)?;
        out.write_all(b"\n")?;
    }

    out.flush()?;
    Ok(summary)
}
