//! Failure classification and backoff policies.
//!
//! Storage clients report failures as text such as
//! `Error creating Blob for "a.txt". Status: 423`. The status code decides
//! whether the session gives up or waits and tries again.

use rand::Rng;
use std::time::Duration;

/// Failures that are retried inside the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientFailure {
    /// 423: the blob is locked by another writer
    Locked,
    /// 429: the storage backend is rate limiting us
    RateLimited,
}

impl std::fmt::Display for TransientFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransientFailure::Locked => write!(f, "locked"),
            TransientFailure::RateLimited => write!(f, "rate limited"),
        }
    }
}

/// Classification of a failed upload attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// 413: the file would exceed the storage quota
    QuotaExceeded,
    Transient(TransientFailure),
    Other,
}

/// Classify an error message into a FailureKind
pub fn classify_failure(message: &str) -> FailureKind {
    if message.contains("Status: 413") {
        FailureKind::QuotaExceeded
    } else if message.contains("Status: 423") {
        FailureKind::Transient(TransientFailure::Locked)
    } else if message.contains("Status: 429") {
        FailureKind::Transient(TransientFailure::RateLimited)
    } else {
        FailureKind::Other
    }
}

const PHASE_PREFIXES: [&str; 2] = ["Error creating Blob for", "Error storing"];

/// Rewrite phase-specific wording so every failure reads as an upload failure
pub fn normalize_phase(message: &str) -> String {
    for prefix in PHASE_PREFIXES {
        if let Some(rest) = message.strip_prefix(prefix) {
            return format!("Error uploading{}", rest);
        }
    }
    message.to_string()
}

/// User-facing quota message for a 413 failure
pub fn quota_message(message: &str, size_in_megabytes: u64) -> String {
    let lead = match message.find("Status:") {
        Some(index) => message[..index].trim_end(),
        None => message.trim_end(),
    };

    let quota = format!(
        "This file's size ({}MB) would exceed your account's storage quota.",
        size_in_megabytes
    );

    if lead.is_empty() {
        quota
    } else {
        format!("{} {}", lead, quota)
    }
}

/// Decides how long to wait before retrying a transient failure
pub trait BackoffPolicy: Send + Sync {
    /// Delay before retry number `attempt` (starting at 1)
    fn delay(&self, failure: TransientFailure, attempt: u32) -> Duration;

    /// Whether retry number `attempt` should happen at all
    fn should_retry(&self, _failure: TransientFailure, _attempt: u32) -> bool {
        true
    }
}

/// Storage backoff: short jittered waits on lock contention, a fixed long
/// wait when rate limited, no retry cap unless one is set
#[derive(Debug, Clone)]
pub struct DefaultBackoff {
    pub locked_delay: Duration,
    pub locked_jitter: Duration,
    pub rate_limited_delay: Duration,
    pub max_retries: Option<u32>,
}

impl Default for DefaultBackoff {
    fn default() -> Self {
        Self {
            locked_delay: Duration::from_millis(500),
            locked_jitter: Duration::from_millis(1500),
            rate_limited_delay: Duration::from_secs(10),
            max_retries: None,
        }
    }
}

impl DefaultBackoff {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }
}

impl BackoffPolicy for DefaultBackoff {
    fn delay(&self, failure: TransientFailure, _attempt: u32) -> Duration {
        match failure {
            TransientFailure::Locked => {
                let jitter_ms = self.locked_jitter.as_millis() as u64;
                let jitter = rand::rng().random_range(0..=jitter_ms);
                self.locked_delay + Duration::from_millis(jitter)
            }
            TransientFailure::RateLimited => self.rate_limited_delay,
        }
    }

    fn should_retry(&self, _failure: TransientFailure, attempt: u32) -> bool {
        match self.max_retries {
            Some(max) => attempt <= max,
            None => true,
        }
    }
}

/// Same delay for every transient failure
#[derive(Debug, Clone, Copy)]
pub struct FixedBackoff(pub Duration);

impl BackoffPolicy for FixedBackoff {
    fn delay(&self, _failure: TransientFailure, _attempt: u32) -> Duration {
        self.0
    }
}
