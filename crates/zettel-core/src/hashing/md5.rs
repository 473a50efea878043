//! MD5 content hasher
//!
//! MD5 is the default because existing vaults already carry canonical asset
//! names in this format (`<32 hex chars>.<ext>`).

use super::ContentHasher;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// MD5-based content hasher
#[derive(Debug, Clone, Default)]
pub struct Md5Hasher {
    /// Counter for tracking hash operations
    operation_count: Arc<AtomicUsize>,
}

impl Md5Hasher {
    /// Create a new MD5 hasher instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of digests computed by this instance
    pub fn operation_count(&self) -> usize {
        self.operation_count.load(Ordering::Relaxed)
    }
}

impl ContentHasher for Md5Hasher {
    fn hash_bytes(&self, data: &[u8]) -> String {
        self.operation_count.fetch_add(1, Ordering::Relaxed);
        format!("{:x}", md5::compute(data))
    }

    fn algorithm_name(&self) -> &'static str {
        "md5"
    }

    fn hash_length(&self) -> usize {
        16
    }
}
