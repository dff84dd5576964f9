//! Threat verdict types and score accumulation.

use crate::config::ScoringConfig;
use crate::detectors::DetectorResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordinal threat classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatLevel {
    /// Allow silently
    Low,
    /// Allow, log for review
    Medium,
    /// Reject
    High,
    /// Reject
    Critical,
}

impl ThreatLevel {
    /// Map a clamped score onto a level.
    pub fn from_score(score: u8, scoring: &ScoringConfig) -> Self {
        if score >= scoring.critical_threshold {
            ThreatLevel::Critical
        } else if score >= scoring.violation_threshold {
            ThreatLevel::High
        } else if score >= scoring.disclosure_threshold {
            ThreatLevel::Medium
        } else {
            ThreatLevel::Low
        }
    }

    /// Whether a request at this level is rejected.
    pub fn is_blocking(&self, block_medium: bool) -> bool {
        match self {
            ThreatLevel::High | ThreatLevel::Critical => true,
            ThreatLevel::Medium => block_medium,
            ThreatLevel::Low => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatLevel::Low => "low",
            ThreatLevel::Medium => "medium",
            ThreatLevel::High => "high",
            ThreatLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The engine's verdict for one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatDetectionResult {
    /// Reject the submission
    pub is_blocked: bool,
    /// Classification of the score
    pub threat_level: ThreatLevel,
    /// Composite score (0-100)
    pub score: u8,
    /// Leading reasons in evaluation order; server-side use only
    pub reasons: Vec<String>,
}

impl ThreatDetectionResult {
    /// Verdict for an identity already on the blacklist.
    pub fn blacklisted() -> Self {
        Self {
            is_blocked: true,
            threat_level: ThreatLevel::Critical,
            score: 100,
            reasons: vec!["IP address is blacklisted".to_string()],
        }
    }

    /// Message safe to show the submitting client.
    ///
    /// Never includes `reasons`.
    pub fn public_message(&self) -> &'static str {
        if self.is_blocked {
            "Your submission could not be processed. Please try again later."
        } else {
            "Thank you, your submission has been received."
        }
    }
}

/// Collects detector output in evaluation order.
#[derive(Debug, Default)]
pub struct ScoreAccumulator {
    score: u32,
    flags: Vec<String>,
}

impl ScoreAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a detector result in.
    pub fn add(&mut self, result: DetectorResult) {
        self.score = self.score.saturating_add(result.score);
        self.flags.extend(result.flags);
    }

    /// Add a single weighted flag.
    pub fn flag(&mut self, weight: u32, flag: impl Into<String>) {
        self.score = self.score.saturating_add(weight);
        self.flags.push(flag.into());
    }

    /// Score clamped to 0-100.
    pub fn clamped(&self) -> u8 {
        self.score.min(100) as u8
    }

    /// Every flag collected so far.
    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    /// Build the final verdict.
    pub fn finish(self, scoring: &ScoringConfig) -> ThreatDetectionResult {
        let score = self.clamped();
        let threat_level = ThreatLevel::from_score(score, scoring);
        let mut reasons = self.flags;
        reasons.truncate(scoring.max_reasons);

        ThreatDetectionResult {
            is_blocked: threat_level.is_blocking(scoring.block_medium),
            threat_level,
            score,
            reasons,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_boundaries() {
        let s = ScoringConfig::default();
        assert_eq!(ThreatLevel::from_score(0, &s), ThreatLevel::Low);
        assert_eq!(ThreatLevel::from_score(14, &s), ThreatLevel::Low);
        assert_eq!(ThreatLevel::from_score(15, &s), ThreatLevel::Medium);
        assert_eq!(ThreatLevel::from_score(29, &s), ThreatLevel::Medium);
        assert_eq!(ThreatLevel::from_score(30, &s), ThreatLevel::High);
        assert_eq!(ThreatLevel::from_score(49, &s), ThreatLevel::High);
        assert_eq!(ThreatLevel::from_score(50, &s), ThreatLevel::Critical);
        assert_eq!(ThreatLevel::from_score(100, &s), ThreatLevel::Critical);
    }

    #[test]
    fn test_blocking() {
        assert!(!ThreatLevel::Low.is_blocking(true));
        assert!(!ThreatLevel::Medium.is_blocking(false));
        assert!(ThreatLevel::Medium.is_blocking(true));
        assert!(ThreatLevel::High.is_blocking(false));
        assert!(ThreatLevel::Critical.is_blocking(false));
    }

    #[test]
    fn test_accumulator_clamps_and_truncates() {
        let mut acc = ScoreAccumulator::new();
        for i in 0..8 {
            acc.flag(20, format!("reason {i}"));
        }
        let result = acc.finish(&ScoringConfig::default());

        assert_eq!(result.score, 100);
        assert_eq!(result.threat_level, ThreatLevel::Critical);
        assert!(result.is_blocked);
        assert_eq!(result.reasons.len(), 5);
        assert_eq!(result.reasons[0], "reason 0");
        assert_eq!(result.reasons[4], "reason 4");
    }

    #[test]
    fn test_empty_accumulator_is_low() {
        let result = ScoreAccumulator::new().finish(&ScoringConfig::default());
        assert_eq!(result.score, 0);
        assert_eq!(result.threat_level, ThreatLevel::Low);
        assert!(!result.is_blocked);
        assert!(result.reasons.is_empty());
    }

    #[test]
    fn test_blacklisted_verdict() {
        let result = ThreatDetectionResult::blacklisted();
        assert!(result.is_blocked);
        assert_eq!(result.threat_level, ThreatLevel::Critical);
        assert_eq!(result.score, 100);
        assert_eq!(result.reasons, vec!["IP address is blacklisted"]);
    }

    #[test]
    fn test_public_message_hides_reasons() {
        let result = ThreatDetectionResult::blacklisted();
        assert!(!result.public_message().contains("blacklisted"));
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_value(ThreatDetectionResult::blacklisted()).unwrap();
        assert_eq!(json["threat_level"], "critical");
        assert_eq!(json["score"], 100);
        assert_eq!(json["is_blocked"], true);
    }
}
