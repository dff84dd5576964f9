//! Honeypot field detection.

use super::DetectorResult;
use std::collections::BTreeMap;

/// Score for a filled decoy field.
const HONEYPOT_SCORE: u32 = 50;

/// Checks decoy fields that humans never see.
#[derive(Debug, Clone, Default)]
pub struct HoneypotDetector {
    fields: Vec<String>,
}

impl HoneypotDetector {
    pub fn new<S: AsRef<str>>(fields: &[S]) -> Self {
        Self {
            fields: fields.iter().map(|f| f.as_ref().to_string()).collect(),
        }
    }

    /// Names of decoy fields that carry a value.
    pub fn filled<'a>(&'a self, form: &'a BTreeMap<String, String>) -> impl Iterator<Item = &'a str> + 'a {
        self.fields
            .iter()
            .filter(|name| form.get(name.as_str()).is_some_and(|v| !v.is_empty()))
            .map(String::as_str)
    }

    /// Score the form; any filled decoy is near-conclusive.
    pub fn check(&self, form: &BTreeMap<String, String>) -> DetectorResult {
        if self.filled(form).next().is_some() {
            DetectorResult::new().with_flag(HONEYPOT_SCORE, "Honeypot field filled (bot detected)")
        } else {
            DetectorResult::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_empty_honeypot_is_clean() {
        let detector = HoneypotDetector::new(&["website", "url"]);
        let result = detector.check(&form(&[("name", "Jane"), ("website", "")]));
        assert!(result.is_clean());
    }

    #[test]
    fn test_filled_honeypot() {
        let detector = HoneypotDetector::new(&["website", "url", "homepage"]);
        let fields = form(&[("name", "Jane"), ("url", "x"), ("homepage", "y")]);

        let result = detector.check(&fields);
        assert_eq!(result.score, 50);
        assert_eq!(result.flags.len(), 1);
        assert_eq!(detector.filled(&fields).collect::<Vec<_>>(), vec!["url", "homepage"]);
    }

    #[test]
    fn test_no_configured_fields() {
        let detector = HoneypotDetector::new::<&str>(&[]);
        assert!(detector.check(&form(&[("website", "spam")])).is_clean());
    }
}
