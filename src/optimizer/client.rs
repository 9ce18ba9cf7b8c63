//! Remote compression service client.
//!
//! [`CompressionService`] is the seam between the optimizer and the network:
//! [`TinifyClient`] talks to the real HTTP API, tests plug in fakes.
//!
//! # Protocol
//!
//! - `POST {endpoint}/shrink` with HTTP basic auth `api:<key>` and the raw
//!   picture as body answers `201 Created` with a `Location` header
//! - `GET <Location>` returns the compressed picture
//! - every response carries a `Compression-Count` header with the number of
//!   compressions spent this month
//! - errors come as JSON `{"error": "...", "message": "..."}`

use super::error::OptimizeError;
use super::quota::CompressionQuota;
use crate::config::OptimizerConfig;
use crate::constants::COMPRESSION_COUNT_HEADER;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// A service able to compress picture files.
#[async_trait]
pub trait CompressionService: Send + Sync {
    /// Compress `source` and write the result to `output`.
    async fn compress(&self, source: &Path, output: &Path) -> Result<(), OptimizeError>;

    /// Check that the service accepts `key`.
    async fn validate_key(&self, key: &str) -> Result<(), OptimizeError>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    message: String,
}

/// HTTP client of the tinify compression API.
#[derive(Debug, Clone)]
pub struct TinifyClient {
    http_client: reqwest::Client,
    endpoint: String,
    key: String,
    quota: CompressionQuota,
}

impl TinifyClient {
    /// Create a client authenticating with `key`. Compression counts
    /// reported by the service are stored in `quota`.
    ///
    /// # Errors
    ///
    /// Returns `OptimizeError::Connection` if the HTTP client cannot be created
    pub fn new(
        key: impl Into<String>,
        config: &OptimizerConfig,
        quota: CompressionQuota,
    ) -> Result<Self, OptimizeError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| OptimizeError::Connection(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            key: key.into(),
            quota,
        })
    }

    pub fn quota(&self) -> &CompressionQuota {
        &self.quota
    }

    fn shrink_url(&self) -> String {
        format!("{}/shrink", self.endpoint)
    }

    fn resolve_location(&self, location: &str) -> String {
        if location.starts_with('/') {
            format!("{}{}", self.endpoint, location)
        } else {
            location.to_string()
        }
    }

    fn record_count(&self, response: &reqwest::Response) {
        let count = response
            .headers()
            .get(COMPRESSION_COUNT_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());

        if let Some(count) = count {
            tracing::debug!(compression_count = count, "Compression count updated");
            self.quota.set(count);
        }
    }
}

/// Turn a failed response into an error, using the JSON body when present.
async fn error_from_response(response: reqwest::Response) -> OptimizeError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    let message = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(err) => format!("{}: {}", err.error, err.message),
        Err(_) if !body.trim().is_empty() => body.trim().to_string(),
        Err(_) => status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string(),
    };

    OptimizeError::from_status(status.as_u16(), message)
}

/// Write `data` to a temporary sibling then rename it over `path`.
async fn write_file_atomic(path: &Path, data: &[u8]) -> Result<(), OptimizeError> {
    let temp_path = path.with_extension("part");
    tokio::fs::write(&temp_path, data).await?;

    if let Err(e) = tokio::fs::rename(&temp_path, path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e.into());
    }

    Ok(())
}

#[async_trait]
impl CompressionService for TinifyClient {
    async fn compress(&self, source: &Path, output: &Path) -> Result<(), OptimizeError> {
        let data = tokio::fs::read(source).await?;
        let original_size = data.len();

        let response = self
            .http_client
            .post(self.shrink_url())
            .basic_auth("api", Some(&self.key))
            .body(data)
            .send()
            .await?;
        self.record_count(&response);

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let status = response.status().as_u16();
        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(|v| self.resolve_location(v))
            .ok_or_else(|| OptimizeError::Server {
                status,
                message: "Response has no Location header".to_string(),
            })?;

        let response = self
            .http_client
            .get(&location)
            .basic_auth("api", Some(&self.key))
            .send()
            .await?;
        self.record_count(&response);

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let compressed = response.bytes().await?;
        write_file_atomic(output, &compressed).await?;

        tracing::debug!(
            source = %source.display(),
            output = %output.display(),
            original_size,
            compressed_size = compressed.len(),
            "Picture compressed"
        );

        Ok(())
    }

    async fn validate_key(&self, key: &str) -> Result<(), OptimizeError> {
        let response = self
            .http_client
            .post(self.shrink_url())
            .basic_auth("api", Some(key))
            .send()
            .await?;
        self.record_count(&response);

        // 400: key accepted but no input, 429: key valid with the month spent
        match response.status().as_u16() {
            400 | 429 => Ok(()),
            _ if response.status().is_success() => Ok(()),
            _ => Err(error_from_response(response).await),
        }
    }
}
