//! SHA256 content hasher

use super::ContentHasher;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// SHA256-based content hasher
#[derive(Debug, Clone, Default)]
pub struct Sha256Hasher {
    /// Counter for tracking hash operations (useful for debugging/monitoring)
    operation_count: Arc<AtomicUsize>,
}

impl Sha256Hasher {
    /// Create a new SHA256 hasher instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current operation count
    pub fn operation_count(&self) -> usize {
        self.operation_count.load(Ordering::Relaxed)
    }
}

impl ContentHasher for Sha256Hasher {
    fn hash_bytes(&self, data: &[u8]) -> String {
        self.operation_count.fetch_add(1, Ordering::Relaxed);
        let mut hasher = Sha256::new();
        hasher.update(data);
        hex::encode(hasher.finalize())
    }

    fn algorithm_name(&self) -> &'static str {
        "sha256"
    }

    fn hash_length(&self) -> usize {
        32 // SHA256 produces 32-byte hashes
    }
}
