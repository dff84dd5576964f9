//! CSRF token issuance and validation.
//!
//! One active token per session. A token stays valid for repeated use until
//! it expires or a new one is issued for the same session; there is no
//! consumed state.

use crate::clock::Clock;
use crate::config::CsrfConfig;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use dashmap::DashMap;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use subtle::ConstantTimeEq;

const NONCE_LEN: usize = 16;

/// Stored token for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfTokenRecord {
    pub token: String,
    /// Expiry (ms since epoch); valid while `now <= expires_at`
    pub expires_at: u64,
}

/// Per-session CSRF token manager.
pub struct CsrfTokenManager {
    records: DashMap<String, CsrfTokenRecord>,
    validity_ms: u64,
    constant_time: bool,
    clock: Arc<dyn Clock>,
}

impl CsrfTokenManager {
    /// Create a manager from configuration.
    pub fn new(config: &CsrfConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            records: DashMap::new(),
            validity_ms: config.validity().as_millis() as u64,
            constant_time: config.constant_time_compare,
            clock,
        }
    }

    /// Issue a token for `session_id`, replacing any previous one.
    ///
    /// Token: base64url(SHA-256(session id | issue time | 16 random bytes)).
    pub fn generate_token(&self, session_id: &str) -> String {
        let now = self.clock.now_ms();

        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);

        let mut hasher = Sha256::new();
        hasher.update(session_id.as_bytes());
        hasher.update(b"|");
        hasher.update(now.to_be_bytes());
        hasher.update(b"|");
        hasher.update(nonce);
        let token = URL_SAFE_NO_PAD.encode(hasher.finalize());

        self.records.insert(
            session_id.to_string(),
            CsrfTokenRecord {
                token: token.clone(),
                expires_at: now.saturating_add(self.validity_ms),
            },
        );

        self.prune_expired();
        token
    }

    /// Check `token` against the session's active token.
    pub fn validate_token(&self, session_id: &str, token: &str) -> bool {
        let now = self.clock.now_ms();

        let expired = match self.records.get(session_id) {
            None => return false,
            Some(record) if now > record.expires_at => true,
            Some(record) => return self.matches(&record.token, token),
        };

        if expired {
            self.records
                .remove_if(session_id, |_, record| now > record.expires_at);
        }
        false
    }

    fn matches(&self, stored: &str, provided: &str) -> bool {
        if self.constant_time {
            stored.as_bytes().ct_eq(provided.as_bytes()).into()
        } else {
            stored == provided
        }
    }

    /// Drop the session's token.
    pub fn revoke_token(&self, session_id: &str) -> bool {
        self.records.remove(session_id).is_some()
    }

    /// Sessions with a stored token, expired or not.
    pub fn active_tokens(&self) -> usize {
        self.records.len()
    }

    /// Remove every expired token.
    pub fn prune_expired(&self) -> usize {
        let now = self.clock.now_ms();
        let before = self.records.len();
        self.records.retain(|_, record| now <= record.expires_at);
        before.saturating_sub(self.records.len())
    }
}
