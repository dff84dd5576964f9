//! Threat detection orchestrator.
//!
//! Combines the pure detectors with the stateful limiter and reputation
//! tracker into a single verdict per form submission.

use crate::clock::{Clock, SystemClock};
use crate::config::{FormGuardConfig, PolicyConfig};
use crate::csrf::CsrfTokenManager;
use crate::detectors::{
    ContentThreatAnalyzer, HoneypotDetector, OriginValidator, UserAgentAnalyzer,
};
use crate::limiter::RequestFrequencyLimiter;
use crate::reputation::IpReputationTracker;
use crate::verdict::{ScoreAccumulator, ThreatDetectionResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Score added when the identity is over its request cap.
const RATE_LIMIT_SCORE: u32 = 25;

/// Score added when Content-Length exceeds the policy maximum.
const OVERSIZED_SCORE: u32 = 20;

/// Request attributes already extracted by the web layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormSubmission {
    /// Client IP as trusted by the caller
    pub ip: String,
    /// User-Agent header
    pub user_agent: Option<String>,
    /// Origin header
    pub origin: Option<String>,
    /// Content-Length header in bytes
    pub content_length: u64,
    /// Submitted fields
    pub fields: BTreeMap<String, String>,
}

impl FormSubmission {
    /// Start a submission for `ip`.
    pub fn new(ip: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            ..Default::default()
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn with_content_length(mut self, content_length: u64) -> Self {
        self.content_length = content_length;
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

/// Per-endpoint checks: allowed origins, honeypot fields, size limit.
#[derive(Debug, Clone)]
pub struct FormPolicy {
    origins: OriginValidator,
    honeypots: HoneypotDetector,
    max_content_length: u64,
}

impl FormPolicy {
    pub fn new<A: AsRef<str>, H: AsRef<str>>(
        allowed_origins: &[A],
        honeypot_fields: &[H],
        max_content_length: u64,
    ) -> Self {
        Self {
            origins: OriginValidator::new(allowed_origins),
            honeypots: HoneypotDetector::new(honeypot_fields),
            max_content_length,
        }
    }
}

impl From<&PolicyConfig> for FormPolicy {
    fn from(config: &PolicyConfig) -> Self {
        Self::new(
            config.allowed_origins.as_slice(),
            config.honeypot_fields.as_slice(),
            config.max_content_length,
        )
    }
}

impl Default for FormPolicy {
    fn default() -> Self {
        Self::from(&PolicyConfig::default())
    }
}

/// Entries removed by one prune pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PruneReport {
    pub frequency_windows: usize,
    pub attempt_records: usize,
    pub csrf_tokens: usize,
}

impl PruneReport {
    pub fn total(&self) -> usize {
        self.frequency_windows + self.attempt_records + self.csrf_tokens
    }
}

/// Composes all detectors into one verdict per submission.
pub struct ThreatDetectionOrchestrator {
    config: FormGuardConfig,
    policy: FormPolicy,
    user_agent_analyzer: UserAgentAnalyzer,
    content_analyzer: ContentThreatAnalyzer,
    limiter: RequestFrequencyLimiter,
    reputation: IpReputationTracker,
    csrf: CsrfTokenManager,
}

impl ThreatDetectionOrchestrator {
    /// Create an orchestrator with fresh state.
    pub fn new(config: FormGuardConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            policy: FormPolicy::from(&config.policy),
            user_agent_analyzer: UserAgentAnalyzer::new(),
            content_analyzer: ContentThreatAnalyzer::new(config.content.clone()),
            limiter: RequestFrequencyLimiter::new(&config.limiter, Arc::clone(&clock)),
            reputation: IpReputationTracker::new(config.reputation.clone(), Arc::clone(&clock)),
            csrf: CsrfTokenManager::new(&config.csrf, clock),
            config,
        }
    }

    /// Create with the given configuration and the wall clock.
    pub fn from_config(config: FormGuardConfig) -> Self {
        Self::new(config, Arc::new(SystemClock))
    }

    /// Create with default configuration.
    pub fn with_defaults() -> Self {
        Self::from_config(FormGuardConfig::default())
    }

    /// Replace the content analyzer (custom pattern sets).
    pub fn with_content_analyzer(mut self, analyzer: ContentThreatAnalyzer) -> Self {
        self.content_analyzer = analyzer;
        self
    }

    pub fn config(&self) -> &FormGuardConfig {
        &self.config
    }

    pub fn limiter(&self) -> &RequestFrequencyLimiter {
        &self.limiter
    }

    pub fn reputation(&self) -> &IpReputationTracker {
        &self.reputation
    }

    pub fn csrf(&self) -> &CsrfTokenManager {
        &self.csrf
    }

    /// Evaluate a submission against the configured default policy.
    pub fn detect(&self, submission: &FormSubmission) -> ThreatDetectionResult {
        self.detect_with_policy(submission, &self.policy)
    }

    /// Evaluate a submission against an explicit policy.
    pub fn detect_with_policy(
        &self,
        submission: &FormSubmission,
        policy: &FormPolicy,
    ) -> ThreatDetectionResult {
        let ip = submission.ip.as_str();

        // Known-bad identities skip every other check.
        if self.reputation.is_blocked(ip) {
            return ThreatDetectionResult::blacklisted();
        }

        let mut acc = ScoreAccumulator::new();

        acc.add(policy.origins.check(submission.origin.as_deref()));
        acc.add(
            self.user_agent_analyzer
                .analyze_header(submission.user_agent.as_deref()),
        );
        acc.add(policy.honeypots.check(&submission.fields));
        acc.add(
            self.content_analyzer
                .analyze_fields(submission.fields.values().map(String::as_str)),
        );

        if !self.limiter.record(ip) {
            acc.flag(RATE_LIMIT_SCORE, "Request rate limit exceeded");
        }

        if submission.content_length > policy.max_content_length {
            acc.flag(OVERSIZED_SCORE, "Content-Length exceeds limit");
        }

        let scoring = &self.config.scoring;
        let score = acc.clamped();
        if score >= scoring.disclosure_threshold {
            self.reputation
                .record_attempt(ip, score >= scoring.violation_threshold);
        }

        acc.finish(scoring)
    }

    /// Administrative unblock of an identity.
    pub fn unblock(&self, ip: &str) -> bool {
        self.reputation.unblock(ip)
    }

    /// Prune expired state across every component.
    pub fn prune_expired(&self) -> PruneReport {
        PruneReport {
            frequency_windows: self.limiter.prune_expired(),
            attempt_records: self.reputation.prune_expired(),
            csrf_tokens: self.csrf.prune_expired(),
        }
    }
}

impl Default for ThreatDetectionOrchestrator {
    fn default() -> Self {
        Self::with_defaults()
    }
}
