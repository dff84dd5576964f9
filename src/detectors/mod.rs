//! Threat detection modules.
//!
//! Each detector looks at one aspect of a form submission and returns a score
//! with the flags that produced it. All detectors here are pure: no state, no
//! clock, same input always yields the same result.

pub mod content;
pub mod honeypot;
pub mod origin;
pub mod user_agent;

pub use content::{ContentThreatAnalyzer, PatternCategory, ThreatPattern};
pub use honeypot::HoneypotDetector;
pub use origin::OriginValidator;
pub use user_agent::UserAgentAnalyzer;

/// Result from a detector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectorResult {
    /// Accumulated score from this detector (unclamped)
    pub score: u32,
    /// Every flag that contributed, in evaluation order
    pub flags: Vec<String>,
}

impl DetectorResult {
    /// Create an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a weighted flag.
    pub fn flag(&mut self, weight: u32, flag: impl Into<String>) {
        self.score = self.score.saturating_add(weight);
        self.flags.push(flag.into());
    }

    /// Builder form of [`flag`](Self::flag).
    pub fn with_flag(mut self, weight: u32, flag: impl Into<String>) -> Self {
        self.flag(weight, flag);
        self
    }

    /// True if nothing was flagged.
    pub fn is_clean(&self) -> bool {
        self.flags.is_empty()
    }
}

/// Trait for text analyzers.
pub trait Analyzer: Send + Sync {
    /// Analyze the input and return a detection result.
    fn analyze(&self, input: &str) -> DetectorResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detector_result_accumulates() {
        let mut result = DetectorResult::new();
        assert!(result.is_clean());

        result.flag(10, "first");
        result.flag(3, "second");

        assert_eq!(result.score, 13);
        assert_eq!(result.flags, vec!["first", "second"]);
    }

    #[test]
    fn test_detector_result_saturates() {
        let result = DetectorResult::new()
            .with_flag(u32::MAX, "huge")
            .with_flag(5, "more");
        assert_eq!(result.score, u32::MAX);
    }
}
