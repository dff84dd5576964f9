//! User-Agent analysis detector.
//!
//! Analyzes the User-Agent string for automation indicators:
//! - Missing or truncated values
//! - Bot and tool signatures
//! - Generic or version-stuffed strings
//! - Absence of any mainstream browser token

use super::{Analyzer, DetectorResult};
use regex::Regex;
use std::sync::LazyLock;

/// User-Agents shorter than this carry no further signal.
const MIN_USER_AGENT_LEN: usize = 10;

/// Score for a missing or too-short User-Agent.
const MISSING_SCORE: u32 = 15;

/// Score per matched signature.
const SIGNATURE_WEIGHT: u32 = 8;

/// Score when no mainstream browser is named.
const UNKNOWN_BROWSER_WEIGHT: u32 = 5;

/// Signatures that each add [`SIGNATURE_WEIGHT`].
static SIGNATURES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (Regex::new(r"(?i)bot|crawler|spider|scraper").unwrap(), "Bot signature in User-Agent"),
        (Regex::new(r"(?i)curl|wget|python|java|go-http").unwrap(), "Automation tool in User-Agent"),
        (Regex::new(r"^Mozilla/5\.0$").unwrap(), "Generic User-Agent"),
        (Regex::new(r"\d+(?:\.\d+){4,}").unwrap(), "Version-dense User-Agent"),
    ]
});

/// Mainstream browser tokens.
static BROWSER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)chrome|firefox|safari|edge|opera").unwrap());

/// User-Agent analyzer.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserAgentAnalyzer;

impl UserAgentAnalyzer {
    /// Create a new User-Agent analyzer.
    pub fn new() -> Self {
        Self
    }

    /// Analyze an optional header value; absence scores like a too-short value.
    pub fn analyze_header(&self, user_agent: Option<&str>) -> DetectorResult {
        self.analyze(user_agent.unwrap_or_default())
    }
}

impl Analyzer for UserAgentAnalyzer {
    fn analyze(&self, ua: &str) -> DetectorResult {
        let ua = ua.trim();
        if ua.chars().count() < MIN_USER_AGENT_LEN {
            return DetectorResult::new().with_flag(MISSING_SCORE, "Missing or too short User-Agent");
        }

        let mut result = DetectorResult::new();

        for (pattern, flag) in SIGNATURES.iter() {
            if pattern.is_match(ua) {
                result.flag(SIGNATURE_WEIGHT, *flag);
            }
        }

        if !BROWSER.is_match(ua) {
            result.flag(UNKNOWN_BROWSER_WEIGHT, "Unknown browser");
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/120.0";

    #[test]
    fn test_normal_browser() {
        let result = UserAgentAnalyzer::new().analyze(CHROME);
        assert_eq!(result.score, 0, "flags: {:?}", result.flags);
    }

    #[test]
    fn test_full_chrome_string_is_clean() {
        let ua = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
        assert_eq!(UserAgentAnalyzer::new().analyze(ua).score, 0);
    }

    #[test]
    fn test_missing_ua() {
        let analyzer = UserAgentAnalyzer::new();
        let result = analyzer.analyze_header(None);
        assert_eq!(result.score, 15);
        assert_eq!(result.flags, vec!["Missing or too short User-Agent"]);
        assert_eq!(analyzer.analyze("   ").score, 15);
    }

    #[test]
    fn test_short_ua_is_terminal() {
        // "bot/1" would match the bot signature, but short strings stop early
        let result = UserAgentAnalyzer::new().analyze("bot/1");
        assert_eq!(result.score, 15);
        assert_eq!(result.flags.len(), 1);
    }

    #[test]
    fn test_curl() {
        let result = UserAgentAnalyzer::new().analyze("curl/7.88.0 (x86_64)");
        assert_eq!(result.score, 8 + 5);
        assert!(result.flags.iter().any(|r| r.contains("Automation tool")));
        assert!(result.flags.iter().any(|r| r == "Unknown browser"));
    }

    #[test]
    fn test_crawler_with_browser_token() {
        let ua = "Mozilla/5.0 (compatible; Googlebot/2.1) Chrome/120.0 Safari/537.36";
        let result = UserAgentAnalyzer::new().analyze(ua);
        assert_eq!(result.score, 8);
        assert_eq!(result.flags, vec!["Bot signature in User-Agent"]);
    }

    #[test]
    fn test_generic_mozilla() {
        let result = UserAgentAnalyzer::new().analyze("Mozilla/5.0");
        assert_eq!(result.score, 8 + 5);
        assert!(result.flags.iter().any(|r| r == "Generic User-Agent"));
    }

    #[test]
    fn test_version_dense() {
        let result = UserAgentAnalyzer::new().analyze("Firefox/1.2.3.4.5.6 build");
        assert!(result.flags.iter().any(|r| r == "Version-dense User-Agent"));
    }

    #[test]
    fn test_python_scraper_stacks() {
        let result = UserAgentAnalyzer::new().analyze("python-requests/2.31 scraper");
        assert_eq!(result.score, 8 + 8 + 5);
    }

    #[test]
    fn test_idempotent() {
        let analyzer = UserAgentAnalyzer::new();
        assert_eq!(analyzer.analyze("Wget/1.21.4"), analyzer.analyze("Wget/1.21.4"));
    }
}
