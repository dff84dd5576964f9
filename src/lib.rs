//! Form Guard for Zentinel
//!
//! Request-time threat detection for public form endpoints (contact,
//! newsletter, download). Each submission is scored and classified as
//! low, medium, high or critical.
//!
//! # Features
//!
//! - Sliding-window request frequency limiting
//! - IP reputation with escalating, review-only blacklisting
//! - Spam, SQL injection and XSS content heuristics
//! - User-Agent, Origin and honeypot checks
//! - Per-session CSRF tokens
//!
//! # Example
//!
//! ```no_run
//! use zentinel_form_guard::{FormSubmission, ThreatDetectionOrchestrator};
//!
//! let guard = ThreatDetectionOrchestrator::with_defaults();
//! let submission = FormSubmission::new("198.51.100.7")
//!     .with_user_agent("Mozilla/5.0 (X11; Linux x86_64) Firefox/121.0")
//!     .with_field("message", "Hello!");
//!
//! let verdict = guard.detect(&submission);
//! if verdict.is_blocked {
//!     println!("{}", verdict.public_message());
//! }
//! ```

pub mod clock;
pub mod config;
pub mod csrf;
pub mod detectors;
pub mod error;
mod eviction;
pub mod guard;
pub mod limiter;
pub mod replay;
pub mod reputation;
pub mod sweeper;
pub mod verdict;

pub use clock::{Clock, MockClock, SystemClock};
pub use config::FormGuardConfig;
pub use csrf::CsrfTokenManager;
pub use error::ConfigError;
pub use guard::{FormPolicy, FormSubmission, PruneReport, ThreatDetectionOrchestrator};
pub use limiter::RequestFrequencyLimiter;
pub use reputation::{AttemptRecord, IpReputationTracker, ReputationStats};
pub use verdict::{ThreatDetectionResult, ThreatLevel};
