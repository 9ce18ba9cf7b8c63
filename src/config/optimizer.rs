//! Remote optimizer configuration.
//!
//! This module defines the YAML configuration of the remote compression
//! step: where the service lives and how transient failures are retried.
//!
//! Default values for the retry budget and backoff delays are sourced from `crate::constants`.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_INITIAL_BACKOFF_MS, DEFAULT_MAX_BACKOFF_MS,
    DEFAULT_RETRY_BUDGET, DEFAULT_TINIFY_ENDPOINT,
};

fn default_retry_budget() -> u32 {
    DEFAULT_RETRY_BUDGET
}

fn default_initial_backoff_ms() -> u64 {
    DEFAULT_INITIAL_BACKOFF_MS
}

fn default_max_backoff_ms() -> u64 {
    DEFAULT_MAX_BACKOFF_MS
}

fn default_endpoint() -> String {
    DEFAULT_TINIFY_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

/// Optimizer configuration (YAML format)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Retries allowed after the first attempt
    #[serde(default = "default_retry_budget")]
    pub retry_budget: u32,
    /// Initial backoff delay in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Maximum backoff delay in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    /// Base URL of the compression service
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            retry_budget: default_retry_budget(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl OptimizerConfig {
    /// Convert to RetryPolicy from retry module
    pub fn to_retry_policy(&self) -> crate::retry::RetryPolicy {
        crate::retry::RetryPolicy::new(
            self.retry_budget,
            self.initial_backoff_ms,
            self.max_backoff_ms,
        )
    }
}
