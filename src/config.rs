//! Configuration types for the form guard.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration for the form guard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FormGuardConfig {
    /// Per-identity request frequency limits
    pub limiter: LimiterConfig,

    /// IP reputation escalation
    pub reputation: ReputationConfig,

    /// Content analysis bounds and heuristics
    pub content: ContentConfig,

    /// CSRF token lifecycle
    pub csrf: CsrfConfig,

    /// Score thresholds and verdict policy
    pub scoring: ScoringConfig,

    /// Default request policy (origins, honeypots, size)
    pub policy: PolicyConfig,

    /// Background sweep of expired state
    pub sweep: SweepConfig,
}

impl FormGuardConfig {
    /// Load configuration from a JSON or YAML file (by extension) and validate it.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = if path
            .extension()
            .is_some_and(|e| e == "yaml" || e == "yml")
        {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.limiter.window_seconds == 0 {
            return Err(ConfigError::invalid("limiter.window_seconds", "must be > 0"));
        }
        if self.limiter.max_requests == 0 {
            return Err(ConfigError::invalid("limiter.max_requests", "must be > 0"));
        }
        if self.reputation.window_seconds == 0 {
            return Err(ConfigError::invalid("reputation.window_seconds", "must be > 0"));
        }
        if self.reputation.block_threshold == 0 {
            return Err(ConfigError::invalid("reputation.block_threshold", "must be > 0"));
        }
        if self.reputation.suspicious_threshold >= self.reputation.block_threshold {
            return Err(ConfigError::invalid(
                "reputation.suspicious_threshold",
                format!(
                    "must be below block_threshold ({})",
                    self.reputation.block_threshold
                ),
            ));
        }
        if self.csrf.token_validity_seconds == 0 {
            return Err(ConfigError::invalid("csrf.token_validity_seconds", "must be > 0"));
        }
        if self.content.max_analyzed_bytes == 0 {
            return Err(ConfigError::invalid("content.max_analyzed_bytes", "must be > 0"));
        }
        if !(0.0..=1.0).contains(&self.content.low_diversity_ratio) {
            return Err(ConfigError::invalid(
                "content.low_diversity_ratio",
                "must be within 0.0..=1.0",
            ));
        }

        let s = &self.scoring;
        if !(s.disclosure_threshold <= s.violation_threshold
            && s.violation_threshold <= s.critical_threshold
            && s.critical_threshold <= 100)
        {
            return Err(ConfigError::invalid(
                "scoring",
                "thresholds must satisfy disclosure <= violation <= critical <= 100",
            ));
        }
        if s.max_reasons == 0 {
            return Err(ConfigError::invalid("scoring.max_reasons", "must be > 0"));
        }
        if self.sweep.enabled && self.sweep.interval_seconds == 0 {
            return Err(ConfigError::invalid("sweep.interval_seconds", "must be > 0"));
        }

        Ok(())
    }
}

/// Sliding-window request limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimiterConfig {
    /// Trailing window length in seconds
    pub window_seconds: u64,

    /// Requests allowed per identity within the window
    pub max_requests: u32,

    /// Maximum identities to track before evicting
    pub max_tracked_identities: usize,
}

impl LimiterConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            window_seconds: 60,
            max_requests: 30,
            max_tracked_identities: 100_000,
        }
    }
}

/// Reputation escalation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReputationConfig {
    /// Attempt counts reset after this many idle seconds
    pub window_seconds: u64,

    /// Weighted count at which an identity is blacklisted
    pub block_threshold: u32,

    /// Weighted count at which an identity is reported as suspicious
    pub suspicious_threshold: u32,

    /// Increment for a flagged violation
    pub violation_weight: u32,

    /// Increment for a neutral attempt
    pub attempt_weight: u32,

    /// Maximum identities to track before evicting
    pub max_tracked_identities: usize,
}

impl ReputationConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }
}

impl Default for ReputationConfig {
    fn default() -> Self {
        Self {
            window_seconds: 3600,
            block_threshold: 10,
            suspicious_threshold: 5,
            violation_weight: 3,
            attempt_weight: 1,
            max_tracked_identities: 100_000,
        }
    }
}

/// Content analysis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Pattern matching only looks at this many leading bytes
    pub max_analyzed_bytes: usize,

    /// Content longer than this many characters is flagged
    pub long_content_chars: usize,

    /// Unique-character ratio below which content is flagged as flooding
    pub low_diversity_ratio: f64,

    /// Diversity is only measured on content of at least this many characters.
    /// Below 11 characters the ratio cannot drop under 0.1 for any text with
    /// two distinct characters.
    pub min_diversity_chars: usize,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            max_analyzed_bytes: 8 * 1024,
            long_content_chars: 5000,
            low_diversity_ratio: 0.1,
            min_diversity_chars: 11,
        }
    }
}

/// CSRF token settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CsrfConfig {
    /// Token validity in seconds
    pub token_validity_seconds: u64,

    /// Compare tokens in constant time
    pub constant_time_compare: bool,
}

impl CsrfConfig {
    pub fn validity(&self) -> Duration {
        Duration::from_secs(self.token_validity_seconds)
    }
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            token_validity_seconds: 3600,
            constant_time_compare: false,
        }
    }
}

/// Score thresholds for verdicts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Score at which a request counts against reputation (medium)
    pub disclosure_threshold: u8,

    /// Score at which a request is a violation (high, blocked)
    pub violation_threshold: u8,

    /// Score at which a request is critical (blocked)
    pub critical_threshold: u8,

    /// Block medium-level requests as well
    pub block_medium: bool,

    /// Maximum reasons reported in a result
    pub max_reasons: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            disclosure_threshold: 15,
            violation_threshold: 30,
            critical_threshold: 50,
            block_medium: false,
            max_reasons: 5,
        }
    }
}

/// Default per-request policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Allowed Origin hosts (bare hostnames or full origins); empty disables the check
    pub allowed_origins: Vec<String>,

    /// Decoy field names that humans never fill in
    pub honeypot_fields: Vec<String>,

    /// Maximum accepted Content-Length in bytes
    pub max_content_length: u64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![],
            honeypot_fields: vec![
                "website".to_string(),
                "url".to_string(),
                "homepage".to_string(),
            ],
            max_content_length: 100 * 1024,
        }
    }
}

/// Background sweep settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Run the background sweep
    pub enabled: bool,

    /// Seconds between sweeps
    pub interval_seconds: u64,
}

impl SweepConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: 300,
        }
    }
}
