//! Monthly compression quota.
//!
//! The service counts compressions per key and billing period and reports
//! the running count on each response. [`CompressionQuota`] mirrors that
//! count: the client writes it, the optimizer only reads it before each call.
//! Clones share the same counter.

use crate::constants::COMPRESSION_QUOTA_CEILING;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct CompressionQuota {
    used: Arc<AtomicU64>,
}

impl CompressionQuota {
    /// Quota with `used` compressions already spent.
    pub fn new(used: u64) -> Self {
        Self {
            used: Arc::new(AtomicU64::new(used)),
        }
    }

    pub fn used(&self) -> u64 {
        self.used.load(Ordering::SeqCst)
    }

    /// Record the count reported by the service.
    pub fn set(&self, used: u64) {
        self.used.store(used, Ordering::SeqCst);
    }

    /// True once the count went over the free-tier ceiling.
    pub fn is_exhausted(&self) -> bool {
        self.used() > COMPRESSION_QUOTA_CEILING
    }

    /// Compressions left before the ceiling is passed.
    pub fn remaining(&self) -> u64 {
        COMPRESSION_QUOTA_CEILING.saturating_sub(self.used())
    }
}
