//! Content threat analysis.
//!
//! Scans submitted form text for:
//! - Spam and phishing phrasing
//! - SQL injection and XSS payloads
//! - Weaker signals (links, card numbers, shouting, extra addresses)
//! - Oversized or repeated-character content

use super::{Analyzer, DetectorResult};
use crate::config::ContentConfig;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Pattern family, which fixes the weight a match contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternCategory {
    /// Promotional or phishing phrasing
    Spam,
    /// SQL injection and script injection
    Injection,
    /// Suspicious but not disqualifying on its own
    Suspicious,
}

impl PatternCategory {
    /// Score added per matching pattern.
    pub fn weight(&self) -> u32 {
        match self {
            PatternCategory::Spam => 10,
            PatternCategory::Injection => 10,
            PatternCategory::Suspicious => 3,
        }
    }

    /// Prefix used in flags.
    pub fn label(&self) -> &'static str {
        match self {
            PatternCategory::Spam => "Spam content",
            PatternCategory::Injection => "Injection attempt",
            PatternCategory::Suspicious => "Suspicious content",
        }
    }
}

/// One entry in a pattern set.
#[derive(Debug, Clone)]
pub struct ThreatPattern {
    /// Stable identifier
    pub name: String,
    /// Family the pattern belongs to
    pub category: PatternCategory,
    /// Score added when the pattern fires
    pub weight: u32,
    /// Compiled expression
    pub regex: Regex,
    /// Human-readable description used in flags
    pub description: String,
    /// Matches required before the pattern fires
    pub min_matches: usize,
}

impl ThreatPattern {
    /// Compile a pattern with its category's default weight.
    pub fn new(
        name: impl Into<String>,
        category: PatternCategory,
        pattern: &str,
        description: impl Into<String>,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.into(),
            category,
            weight: category.weight(),
            regex: Regex::new(pattern)?,
            description: description.into(),
            min_matches: 1,
        })
    }

    /// Override the weight.
    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    /// Require several distinct matches before firing.
    pub fn with_min_matches(mut self, min_matches: usize) -> Self {
        self.min_matches = min_matches.max(1);
        self
    }

    /// True if the pattern fires on `text`.
    pub fn matches(&self, text: &str) -> bool {
        if self.min_matches <= 1 {
            self.regex.is_match(text)
        } else {
            self.regex.find_iter(text).take(self.min_matches).count() >= self.min_matches
        }
    }

    /// Flag text reported when the pattern fires.
    pub fn flag(&self) -> String {
        format!("{}: {}", self.category.label(), self.description)
    }
}

fn builtin(
    name: &str,
    category: PatternCategory,
    pattern: &str,
    description: &str,
) -> ThreatPattern {
    ThreatPattern::new(name, category, pattern, description)
        .unwrap_or_else(|e| panic!("builtin pattern {name} failed to compile: {e}"))
}

/// Built-in pattern set.
static DEFAULT_PATTERNS: LazyLock<Vec<ThreatPattern>> = LazyLock::new(|| {
    use PatternCategory::*;
    vec![
        // Spam / phishing lexicon
        builtin("spam_pharma", Spam,
            r"(?i)\b(viagra|cialis|levitra|online pharmacy|pills? online)\b",
            "pharmaceutical promotion"),
        builtin("spam_gambling", Spam,
            r"(?i)\b(casino|lottery|jackpot|sports betting)\b",
            "gambling promotion"),
        builtin("spam_call_to_action", Spam,
            r"(?i)\b(click here|buy now|order now|act now|limited time offer)\b",
            "promotional call to action"),
        builtin("spam_easy_money", Spam,
            r"(?i)\b(make money fast|work from home|get rich|double your (money|income)|earn \$?\d+k? (per|a) (day|week))\b",
            "easy money offer"),
        builtin("spam_prize", Spam,
            r"(?i)\b(you have won|you won|claim your (prize|reward)|free (money|gift|iphone)|congratulations,? you)\b",
            "prize or giveaway"),
        builtin("spam_phishing", Spam,
            r"(?i)\b(verify your account|confirm your (password|identity)|update your (payment|billing) (info|information|details)|account (has been )?(suspended|locked))\b",
            "phishing phrasing"),
        builtin("spam_crypto", Spam,
            r"(?i)\b(crypto(currency)? investment|bitcoin (doubler|investment|giveaway)|forex signals|guaranteed returns?)\b",
            "investment scheme"),
        builtin("spam_seo", Spam,
            r"(?i)\b(seo services|backlinks?|rank #?1 on google|increase your (web)?site traffic)\b",
            "SEO solicitation"),
        builtin("spam_risk_free", Spam,
            r"(?i)(100% free|\brisk[- ]free\b|\bno credit check\b)",
            "too-good-to-be-true offer"),

        // SQL injection
        builtin("sql_tautology", Injection,
            r#"(?i)['"]\s*(or|and)\s+['"]?\w+['"]?\s*=\s*['"]?\w+"#,
            "SQL tautology"),
        builtin("sql_union_select", Injection,
            r"(?i)\bunion\s+(all\s+)?select\b",
            "SQL UNION SELECT"),
        builtin("sql_schema_change", Injection,
            r"(?i)\b(drop|truncate|alter)\s+(table|database)\b",
            "SQL schema statement"),
        builtin("sql_stacked_query", Injection,
            r"(?i);\s*(drop|delete|insert|update|exec|shutdown)\b",
            "stacked SQL query"),
        builtin("sql_comment", Injection,
            r"(?m)--\s*$|/\*.*\*/",
            "SQL comment terminator"),
        builtin("sql_data_statement", Injection,
            r"(?i)\binsert\s+into\s+\w+\s*(\(|values\b)|\bdelete\s+from\s+\w+\s+where\b",
            "SQL data statement"),
        builtin("sql_recon", Injection,
            r"(?i)\b(sleep|benchmark|pg_sleep)\s*\(\s*\d+|\bwaitfor\s+delay\b|\bxp_cmdshell\b|\binformation_schema\b",
            "SQL timing or schema reconnaissance"),

        // Script injection
        builtin("xss_script_tag", Injection,
            r"(?i)<\s*script\b",
            "script tag"),
        builtin("xss_javascript_uri", Injection,
            r"(?i)javascript\s*:",
            "javascript: URI"),
        builtin("xss_event_handler", Injection,
            r"(?i)\bon(load|error|click|dblclick|mouseover|mouseout|focus|blur|submit|change|input|keydown|keyup|toggle|animationstart)\s*=",
            "inline event handler"),
        builtin("xss_iframe", Injection,
            r"(?i)<\s*iframe\b",
            "iframe tag"),
        builtin("xss_embedded_object", Injection,
            r"(?i)<\s*(object|embed)\b",
            "embedded object tag"),

        // Weaker signals
        builtin("suspicious_url", Suspicious,
            r"(?i)\b(https?://|www\.)\S+",
            "contains URL"),
        builtin("suspicious_card_number", Suspicious,
            r"\b(?:\d[ -]?){12,15}\d\b",
            "card-like digit sequence"),
        builtin("suspicious_all_caps", Suspicious,
            r"\b[A-Z]{5,}\b",
            "all-caps text"),
        builtin("suspicious_extra_email", Suspicious,
            r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}",
            "multiple email addresses")
            .with_min_matches(2),
    ]
});

/// Weight for content longer than the configured limit.
const LONG_CONTENT_WEIGHT: u32 = 5;
/// Weight for repeated-character flooding.
const LOW_DIVERSITY_WEIGHT: u32 = 8;

/// Content threat analyzer.
#[derive(Debug, Clone)]
pub struct ContentThreatAnalyzer {
    patterns: Vec<ThreatPattern>,
    config: ContentConfig,
}

impl ContentThreatAnalyzer {
    /// Create an analyzer with the built-in pattern set.
    pub fn new(config: ContentConfig) -> Self {
        Self {
            patterns: DEFAULT_PATTERNS.clone(),
            config,
        }
    }

    /// Replace the pattern set.
    pub fn with_patterns(mut self, patterns: Vec<ThreatPattern>) -> Self {
        self.patterns = patterns;
        self
    }

    /// Append patterns to the current set.
    pub fn extend_patterns(mut self, patterns: impl IntoIterator<Item = ThreatPattern>) -> Self {
        self.patterns.extend(patterns);
        self
    }

    /// The active pattern set.
    pub fn patterns(&self) -> &[ThreatPattern] {
        &self.patterns
    }

    /// Look up a pattern by name.
    pub fn pattern(&self, name: &str) -> Option<&ThreatPattern> {
        self.patterns.iter().find(|p| p.name == name)
    }

    /// Analyze a set of field values as one body of text.
    pub fn analyze_fields<'a>(&self, values: impl IntoIterator<Item = &'a str>) -> DetectorResult {
        let text = values
            .into_iter()
            .filter(|v| !v.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        self.analyze(&text)
    }

    /// Leading slice of `text` no longer than `max_bytes`, cut on a char boundary.
    fn bounded(text: &str, max_bytes: usize) -> &str {
        if text.len() <= max_bytes {
            return text;
        }
        let mut end = max_bytes;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        &text[..end]
    }

    fn diversity_ratio(text: &str) -> (usize, f64) {
        let mut unique = HashSet::new();
        let mut len = 0usize;
        for c in text.chars() {
            unique.insert(c);
            len += 1;
        }
        if len == 0 {
            return (0, 1.0);
        }
        (len, unique.len() as f64 / len as f64)
    }
}

impl Default for ContentThreatAnalyzer {
    fn default() -> Self {
        Self::new(ContentConfig::default())
    }
}

impl Analyzer for ContentThreatAnalyzer {
    fn analyze(&self, text: &str) -> DetectorResult {
        let mut result = DetectorResult::new();
        if text.is_empty() {
            return result;
        }

        let analyzed = Self::bounded(text, self.config.max_analyzed_bytes);

        for pattern in &self.patterns {
            if pattern.matches(analyzed) {
                result.flag(pattern.weight, pattern.flag());
            }
        }

        if text.chars().count() > self.config.long_content_chars {
            result.flag(LONG_CONTENT_WEIGHT, "Unusually long content");
        }

        let (len, ratio) = Self::diversity_ratio(analyzed);
        if len >= self.config.min_diversity_chars && ratio < self.config.low_diversity_ratio {
            result.flag(LOW_DIVERSITY_WEIGHT, "Low character diversity (repeated characters)");
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fires(name: &str, sample: &str) -> bool {
        let analyzer = ContentThreatAnalyzer::default();
        analyzer
            .pattern(name)
            .unwrap_or_else(|| panic!("no pattern named {name}"))
            .matches(sample)
    }

    #[test]
    fn test_each_pattern_fires_on_its_sample() {
        let cases = [
            ("spam_pharma", "cheap viagra today"),
            ("spam_gambling", "best online casino bonus"),
            ("spam_call_to_action", "Click here to see"),
            ("spam_easy_money", "work from home and relax"),
            ("spam_prize", "Congratulations, you are selected"),
            ("spam_phishing", "please verify your account now"),
            ("spam_crypto", "guaranteed returns every month"),
            ("spam_seo", "we sell backlinks cheap"),
            ("spam_risk_free", "completely 100% free"),
            ("sql_tautology", "admin' or 1=1"),
            ("sql_union_select", "1 UNION ALL SELECT password"),
            ("sql_schema_change", "drop table users"),
            ("sql_stacked_query", "x'; DELETE FROM users"),
            ("sql_comment", "admin'--"),
            ("sql_data_statement", "INSERT INTO users (name) VALUES ('x')"),
            ("sql_recon", "1 AND SLEEP(5)"),
            ("xss_script_tag", "<script>alert(1)</script>"),
            ("xss_javascript_uri", "<a href=\"javascript:alert(1)\">"),
            ("xss_event_handler", "<img src=x onerror=alert(1)>"),
            ("xss_iframe", "<iframe src=//evil>"),
            ("xss_embedded_object", "<embed src=x.swf>"),
            ("suspicious_url", "see https://example.com/page"),
            ("suspicious_card_number", "4111 1111 1111 1111"),
            ("suspicious_all_caps", "this is URGENT"),
            ("suspicious_extra_email", "a@example.com and b@example.org"),
        ];

        for (name, sample) in cases {
            assert!(fires(name, sample), "{name} should fire on {sample:?}");
        }
    }

    #[test]
    fn test_patterns_ignore_benign_text() {
        let analyzer = ContentThreatAnalyzer::default();
        let text = "Hello, I would like to learn about your carbon consulting services.";
        for pattern in analyzer.patterns() {
            assert!(!pattern.matches(text), "{} fired on benign text", pattern.name);
        }
    }

    #[test]
    fn test_single_email_is_not_flagged() {
        assert!(!fires("suspicious_extra_email", "reach me at jane@example.com"));
    }

    #[test]
    fn test_empty_input() {
        let analyzer = ContentThreatAnalyzer::default();
        let result = analyzer.analyze("");
        assert_eq!(result.score, 0);
        assert!(result.flags.is_empty());
    }

    #[test]
    fn test_sql_injection_scores_multiple_patterns() {
        let analyzer = ContentThreatAnalyzer::default();
        let result = analyzer.analyze("' OR 1=1; DROP TABLE users; --");

        let injection_flags = result
            .flags
            .iter()
            .filter(|f| f.starts_with(PatternCategory::Injection.label()))
            .count();
        assert!(injection_flags >= 2, "flags: {:?}", result.flags);
        assert!(result.score >= 30);
    }

    #[test]
    fn test_spam_weight() {
        let analyzer = ContentThreatAnalyzer::default();
        let result = analyzer.analyze("cheap viagra today");
        assert_eq!(result.score, 10);
        assert_eq!(result.flags, vec!["Spam content: pharmaceutical promotion"]);
    }

    #[test]
    fn test_suspicious_weight() {
        let analyzer = ContentThreatAnalyzer::default();
        let result = analyzer.analyze("details at https://example.com/info");
        assert_eq!(result.score, 3);
    }

    #[test]
    fn test_long_content() {
        let analyzer = ContentThreatAnalyzer::default();
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(120);
        let result = analyzer.analyze(&text);
        assert!(result.flags.iter().any(|f| f == "Unusually long content"));
    }

    #[test]
    fn test_repeated_character_flood() {
        let analyzer = ContentThreatAnalyzer::default();
        let result = analyzer.analyze(&"a".repeat(200));
        assert!(result
            .flags
            .iter()
            .any(|f| f.starts_with("Low character diversity")));
        assert_eq!(result.score, 8);
    }

    #[test]
    fn test_short_repeated_flood_is_flagged() {
        let analyzer = ContentThreatAnalyzer::default();
        let result = analyzer.analyze(&"a".repeat(18));
        assert_eq!(result.score, 8);

        // Two distinct characters at the minimum length stay above the ratio
        assert_eq!(analyzer.analyze("ab").score, 0);
        assert_eq!(analyzer.analyze("abababababa").score, 0);
    }

    #[test]
    fn test_short_text_skips_diversity() {
        let analyzer = ContentThreatAnalyzer::default();
        assert_eq!(analyzer.analyze("aaaa").score, 0);
    }

    #[test]
    fn test_patterns_only_see_bounded_prefix() {
        let config = ContentConfig {
            max_analyzed_bytes: 64,
            ..Default::default()
        };
        let analyzer = ContentThreatAnalyzer::new(config);
        let text = format!("{} <script>alert(1)</script>", "hello world ".repeat(20));
        let result = analyzer.analyze(&text);
        assert!(!result.flags.iter().any(|f| f.contains("script tag")));
    }

    #[test]
    fn test_bounded_respects_char_boundary() {
        let text = "ééééé";
        let cut = ContentThreatAnalyzer::bounded(text, 3);
        assert_eq!(cut, "é");
    }

    #[test]
    fn test_idempotent() {
        let analyzer = ContentThreatAnalyzer::default();
        let text = "CLICK HERE for free money at http://spam.example <script>";
        assert_eq!(analyzer.analyze(text), analyzer.analyze(text));
    }

    #[test]
    fn test_custom_patterns() {
        let custom = ThreatPattern::new(
            "custom_competitor",
            PatternCategory::Spam,
            r"(?i)\bacme corp\b",
            "competitor mention",
        )
        .unwrap()
        .with_weight(25);
        let analyzer = ContentThreatAnalyzer::default().with_patterns(vec![custom]);

        let result = analyzer.analyze("Try ACME Corp instead <script>");
        assert_eq!(result.score, 25);
        assert_eq!(result.flags, vec!["Spam content: competitor mention"]);
    }

    #[test]
    fn test_analyze_fields_joins_values() {
        let analyzer = ContentThreatAnalyzer::default();
        let result = analyzer.analyze_fields(["a@example.com", "", "b@example.org"]);
        assert_eq!(result.score, 3);
    }
}
