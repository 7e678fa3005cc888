//! Retry policy shared by all oracle invocations.
//!
//! Two failure classes are distinguished and BOTH are retried: transient
//! infrastructure failures, and structural failures where a generative
//! oracle returned a verdict that fails rubric validation (often
//! non-deterministic, so a retry may succeed).

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Classification of an oracle call failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    /// Infrastructure failure: timeout, rate limit, connection reset.
    Transient,
    /// The oracle returned a structurally invalid verdict: wrong criteria
    /// set, out-of-range score, unparseable payload.
    Validation,
}

impl std::fmt::Display for FailureClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transient => write!(f, "transient"),
            Self::Validation => write!(f, "validation"),
        }
    }
}

/// Bounded-attempt policy with capped exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first (1 = no retries).
    pub max_attempts: u32,
    /// Backoff before the first retry, in milliseconds.
    pub initial_backoff_ms: u64,
    /// Multiplier applied per subsequent retry (2.0 = exponential doubling).
    pub backoff_multiplier: f64,
    /// Ceiling on any single backoff delay.
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    /// Default: 3 attempts, 500ms initial backoff, 2x multiplier, 10s cap.
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 500,
            backoff_multiplier: 2.0,
            max_backoff_ms: 10_000,
        }
    }
}

impl RetryPolicy {
    /// Backoff to sleep before the given attempt (1-indexed).
    ///
    /// The first attempt runs immediately; attempt `n > 1` waits
    /// `initial * multiplier^(n-2)`, capped at `max_backoff_ms`.
    pub fn backoff_before_ms(&self, attempt: u32) -> u64 {
        if attempt <= 1 {
            return 0;
        }
        let delay = self.initial_backoff_ms as f64
            * self.backoff_multiplier.powi(attempt as i32 - 2);
        (delay as u64).min(self.max_backoff_ms)
    }

    /// Backoff as a `Duration`.
    pub fn backoff_before(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_before_ms(attempt))
    }

    /// Whether another attempt is allowed after `attempts_made` failures.
    pub fn should_retry(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }
}
