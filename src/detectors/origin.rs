//! Origin header validation.
//!
//! Compares the request Origin host against an allow-list. Scheme and port
//! are ignored.

use super::DetectorResult;
use url::Url;

/// Score for a missing or unparseable Origin.
const MALFORMED_SCORE: u32 = 20;

/// Score for a well-formed Origin whose host is not allowed.
const DISALLOWED_SCORE: u32 = 15;

/// Origin allow-list check.
#[derive(Debug, Clone, Default)]
pub struct OriginValidator {
    allowed_hosts: Vec<String>,
}

impl OriginValidator {
    /// Build a validator from hostnames or full origins.
    pub fn new<S: AsRef<str>>(allowed: &[S]) -> Self {
        let allowed_hosts = allowed
            .iter()
            .filter_map(|entry| Self::normalize_entry(entry.as_ref()))
            .collect();
        Self { allowed_hosts }
    }

    /// Allow-list entries may be `example.com`, `https://example.com` or `example.com:8443`.
    fn normalize_entry(entry: &str) -> Option<String> {
        let entry = entry.trim();
        if entry.is_empty() {
            return None;
        }
        if entry.contains("://") {
            return Self::host_of(entry);
        }
        Self::host_of(&format!("http://{entry}"))
    }

    /// Lowercase hostname of an origin string.
    pub fn host_of(origin: &str) -> Option<String> {
        Url::parse(origin.trim())
            .ok()?
            .host_str()
            .map(|h| h.trim_end_matches('.').to_ascii_lowercase())
    }

    /// True if no hosts are configured, which disables the check.
    pub fn is_disabled(&self) -> bool {
        self.allowed_hosts.is_empty()
    }

    /// True if `origin` parses and its host is on the allow-list.
    pub fn is_allowed(&self, origin: &str) -> bool {
        Self::host_of(origin).is_some_and(|host| self.allowed_hosts.contains(&host))
    }

    /// Score the Origin header.
    pub fn check(&self, origin: Option<&str>) -> DetectorResult {
        if self.is_disabled() {
            return DetectorResult::new();
        }

        let origin = origin.map(str::trim).filter(|o| !o.is_empty() && *o != "null");
        match origin.and_then(Self::host_of) {
            None => DetectorResult::new().with_flag(MALFORMED_SCORE, "Missing or malformed Origin header"),
            Some(host) if self.allowed_hosts.contains(&host) => DetectorResult::new(),
            Some(_) => DetectorResult::new().with_flag(DISALLOWED_SCORE, "Origin not allowed"),
        }
    }
}
