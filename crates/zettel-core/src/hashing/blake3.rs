//! BLAKE3 content hasher

use super::ContentHasher;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// BLAKE3-based content hasher
#[derive(Debug, Clone, Default)]
pub struct Blake3Hasher {
    operation_count: Arc<AtomicUsize>,
}

impl Blake3Hasher {
    /// Create a new BLAKE3 hasher instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current operation count
    pub fn operation_count(&self) -> usize {
        self.operation_count.load(Ordering::Relaxed)
    }
}

impl ContentHasher for Blake3Hasher {
    fn hash_bytes(&self, data: &[u8]) -> String {
        self.operation_count.fetch_add(1, Ordering::Relaxed);
        let mut hasher = blake3::Hasher::new();
        hasher.update(data);
        hex::encode(hasher.finalize().as_bytes())
    }

    fn algorithm_name(&self) -> &'static str {
        "blake3"
    }

    fn hash_length(&self) -> usize {
        32 // 256 bits
    }
}
