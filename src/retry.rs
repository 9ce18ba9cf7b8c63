//! Retry Logic with Exponential Backoff
//!
//! Handles transient failures from the remote compression service by
//! retrying the call a bounded number of times.
//!
//! ## Retriable vs Non-Retriable Errors
//!
//! **Retriable Errors** (will be retried):
//! - Connection failures and timeouts
//! - 5xx Server errors - Temporary service issue
//!
//! **Non-Retriable Errors** (fail immediately):
//! - 401 Unauthorized / 429 Too Many Requests - Key rejected or monthly limit reached
//! - Other 4xx - The service refused the picture
//! - Local I/O errors
//!
//! ## Exponential Backoff
//!
//! The budget counts retries, not attempts: a budget of 3 means at most 4
//! calls. Delays before each retry grow exponentially from
//! `initial_backoff_ms`:
//! - Attempt 1: No delay (immediate)
//! - Attempt 2: initial delay
//! - Attempt 3: 2x initial
//! - Capped at max_backoff_ms
//!
//! The default initial delay is 0, so retries happen immediately.
//!
//! ## Configuration Example
//!
//! ```yaml
//! optimizer:
//!   retry_budget: 3
//!   initial_backoff_ms: 250
//!   max_backoff_ms: 2000
//! ```

use crate::constants::{DEFAULT_INITIAL_BACKOFF_MS, DEFAULT_MAX_BACKOFF_MS, DEFAULT_RETRY_BUDGET};
use std::time::Duration;

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Number of retries allowed after the first attempt
    pub retry_budget: u32,
    /// Initial backoff delay in milliseconds
    pub initial_backoff_ms: u64,
    /// Maximum backoff delay in milliseconds (cap for exponential growth)
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retry_budget: DEFAULT_RETRY_BUDGET,
            initial_backoff_ms: DEFAULT_INITIAL_BACKOFF_MS,
            max_backoff_ms: DEFAULT_MAX_BACKOFF_MS,
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy
    pub fn new(retry_budget: u32, initial_backoff_ms: u64, max_backoff_ms: u64) -> Self {
        Self {
            retry_budget,
            initial_backoff_ms,
            max_backoff_ms,
        }
    }

    /// Same policy with another retry budget
    pub fn with_budget(&self, retry_budget: u32) -> Self {
        Self {
            retry_budget,
            ..self.clone()
        }
    }

    /// Total number of calls allowed (initial attempt included)
    pub fn max_attempts(&self) -> u32 {
        self.retry_budget.saturating_add(1)
    }

    /// Check if an HTTP status code should be retried
    pub fn is_retriable_status(status_code: u16) -> bool {
        (500..=599).contains(&status_code)
    }

    /// Calculate backoff delay for a given attempt number (0-indexed)
    ///
    /// # Arguments
    /// * `attempt` - The attempt number (0 = first attempt, 1 = first retry, etc.)
    ///
    /// # Returns
    /// Duration to wait before the attempt (0 for first attempt)
    pub fn backoff_duration(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            // First attempt: no delay
            return Duration::from_millis(0);
        }

        // Exponential backoff: initial_backoff * 2^(attempt-1)
        let backoff_ms = self
            .initial_backoff_ms
            .saturating_mul(2u64.saturating_pow(attempt - 1))
            .min(self.max_backoff_ms);

        Duration::from_millis(backoff_ms)
    }
}
