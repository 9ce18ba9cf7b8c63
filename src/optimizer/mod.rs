//! Remote optimization of watermarked pictures.
//!
//! Watermarked `-w` files can be sent to a compression service; the result
//! is stored as a `-wo` sibling. Calls are retried on transient failures and
//! stop once the monthly compression quota is spent.
//!
//! # Example
//!
//! ```ignore
//! use watermark_me::optimizer::{CompressionQuota, Optimizer, TinifyClient};
//!
//! let quota = CompressionQuota::default();
//! let client = TinifyClient::new(key, &config.optimizer, quota.clone())?;
//! let optimizer = Optimizer::new(client, quota, config.optimizer.to_retry_policy());
//! if optimizer.validate_key(key).await {
//!     let optimized = optimizer.optimize(&watermarked).await?;
//! }
//! ```

pub mod client;
pub mod error;
pub mod processor;
pub mod quota;

pub use client::{CompressionService, TinifyClient};
pub use error::OptimizeError;
pub use processor::Optimizer;
pub use quota::CompressionQuota;
