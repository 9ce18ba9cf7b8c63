//! Remote optimization of watermarked pictures.
//!
//! [`Optimizer`] sends a `-w` file to a [`CompressionService`] and stores the
//! result next to it as `-wo`. Like watermarking it is idempotent: an
//! existing `-wo` file is returned without any call.

use super::client::CompressionService;
use super::error::OptimizeError;
use super::quota::CompressionQuota;
use crate::retry::RetryPolicy;
use crate::watermark::{derive_output, Stage};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct Optimizer<S> {
    service: S,
    quota: CompressionQuota,
    policy: RetryPolicy,
}

impl<S: CompressionService> Optimizer<S> {
    pub fn new(service: S, quota: CompressionQuota, policy: RetryPolicy) -> Self {
        Self {
            service,
            quota,
            policy,
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn quota(&self) -> &CompressionQuota {
        &self.quota
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Optimize `file` with the configured retry budget.
    pub async fn optimize(&self, file: &Path) -> Result<Option<PathBuf>, OptimizeError> {
        self.optimize_with_budget(file, self.policy.retry_budget)
            .await
    }

    /// Optimize `file`, retrying transient failures up to `retry_budget`
    /// times after the first attempt.
    ///
    /// Returns `None` when the monthly quota is spent or the budget runs out.
    /// Every attempt first checks whether the output appeared meanwhile and
    /// whether the quota allows another call.
    ///
    /// # Errors
    ///
    /// Permanent failures (rejected key, refused picture, local I/O) are
    /// returned at once without retrying.
    pub async fn optimize_with_budget(
        &self,
        file: &Path,
        retry_budget: u32,
    ) -> Result<Option<PathBuf>, OptimizeError> {
        let policy = self.policy.with_budget(retry_budget);
        let output = derive_output(file, Stage::Optimized);

        for attempt in 0..policy.max_attempts() {
            if output.exists() {
                tracing::info!(output = %output.display(), "Optimized output already exists, skipping");
                return Ok(Some(output));
            }

            if self.quota.is_exhausted() {
                tracing::info!(
                    compression_count = self.quota.used(),
                    path = %file.display(),
                    "Compression quota exhausted, skipping optimization"
                );
                return Ok(None);
            }

            let delay = policy.backoff_duration(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            match self.service.compress(file, &output).await {
                Ok(()) => return Ok(Some(output)),
                Err(e) if e.is_transient() => {
                    tracing::warn!(
                        path = %file.display(),
                        attempt = attempt + 1,
                        max_attempts = policy.max_attempts(),
                        error = %e,
                        "Transient compression failure"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        tracing::warn!(path = %file.display(), "Retry budget exhausted, picture left unoptimized");
        Ok(None)
    }

    /// Whether `key` is accepted by the service. Never fails: an empty key
    /// or any error answers `false`.
    pub async fn validate_key(&self, key: &str) -> bool {
        if key.is_empty() {
            return false;
        }

        match self.service.validate_key(key).await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(error = %e, "Compression key rejected");
                false
            }
        }
    }
}
