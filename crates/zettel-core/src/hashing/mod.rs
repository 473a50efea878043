//! Content hashing for asset deduplication
//!
//! Digests are lower-case hex strings and double as canonical file names, so
//! two attachments with identical bytes always map to the same
//! `<digest>.<ext>` path. They are a deduplication key only, not an
//! integrity check against tampering.

mod blake3;
mod md5;
mod sha256;

pub use self::blake3::Blake3Hasher;
pub use self::md5::Md5Hasher;
pub use self::sha256::Sha256Hasher;
pub use zettel_config::HashAlgorithm;

use std::sync::Arc;

/// Pure, deterministic digest of binary content
pub trait ContentHasher: Send + Sync {
    /// Hex digest of `data`
    fn hash_bytes(&self, data: &[u8]) -> String;

    /// Name of the algorithm, e.g. `"md5"`
    fn algorithm_name(&self) -> &'static str;

    /// Digest length in bytes
    fn hash_length(&self) -> usize;

    /// Whether `hash` looks like a digest produced by this hasher
    fn is_valid_hash(&self, hash: &str) -> bool {
        hash.len() == self.hash_length() * 2 && hash.chars().all(|c| c.is_ascii_hexdigit())
    }
}

/// Hasher implementing `algorithm`
pub fn hasher_for(algorithm: HashAlgorithm) -> Arc<dyn ContentHasher> {
    match algorithm {
        HashAlgorithm::Md5 => Arc::new(Md5Hasher::new()),
        HashAlgorithm::Sha256 => Arc::new(Sha256Hasher::new()),
        HashAlgorithm::Blake3 => Arc::new(Blake3Hasher::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(HashAlgorithm::Md5, "md5", 32)]
    #[test_case(HashAlgorithm::Sha256, "sha256", 64)]
    #[test_case(HashAlgorithm::Blake3, "blake3", 64)]
    fn test_hasher_for(algorithm: HashAlgorithm, name: &str, hex_len: usize) {
        let hasher = hasher_for(algorithm);
        assert_eq!(hasher.algorithm_name(), name);
        assert_eq!(hasher.hash_bytes(b"png bytes").len(), hex_len);
    }

    #[test_case(HashAlgorithm::Md5)]
    #[test_case(HashAlgorithm::Sha256)]
    #[test_case(HashAlgorithm::Blake3)]
    fn test_deterministic_and_sensitive(algorithm: HashAlgorithm) {
        let hasher = hasher_for(algorithm);
        let data = b"\x89PNG\r\n\x1a\n some image payload".to_vec();
        let mut changed = data.clone();
        changed[12] ^= 0x01;

        assert_eq!(hasher.hash_bytes(&data), hasher.hash_bytes(&data));
        assert_ne!(hasher.hash_bytes(&data), hasher.hash_bytes(&changed));
        assert!(hasher.is_valid_hash(&hasher.hash_bytes(&data)));
    }

    #[test]
    fn test_is_valid_hash_rejects_wrong_shape() {
        let hasher = Md5Hasher::new();
        assert!(!hasher.is_valid_hash(""));
        assert!(!hasher.is_valid_hash("xyz"));
        assert!(!hasher.is_valid_hash(&"g".repeat(32)));
        assert!(hasher.is_valid_hash(&"a".repeat(32)));
    }
}
