use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::language::Language;
use crate::media::MediaConstraints;

/// Configuration for one practice attempt
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Identifier handed to the submission service (e.g., "sess-1-3")
    pub session_id: String,

    /// Question being answered
    pub question_id: String,

    /// Upper bound on the submission call; expiry counts as a failure
    /// Default: 30 seconds
    pub submission_timeout: Duration,

    /// Tracks requested from the media device
    pub constraints: MediaConstraints,

    /// Language of the UI strings exposed by the session
    pub language: Language,
}

impl SessionConfig {
    pub fn new(session_id: impl Into<String>, question_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            question_id: question_id.into(),
            submission_timeout: Duration::from_secs(30),
            constraints: MediaConstraints::default(),
            language: Language::default(),
        }
    }

    pub fn with_submission_timeout(mut self, timeout: Duration) -> Self {
        self.submission_timeout = timeout;
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }
}

/// Monotonic session identifiers derived from the question id
#[derive(Debug, Default)]
pub struct SessionIdGenerator {
    next: AtomicU64,
}

impl SessionIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_for(&self, question_id: &str) -> String {
        let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        format!("sess-{}-{}", question_id, n)
    }
}
