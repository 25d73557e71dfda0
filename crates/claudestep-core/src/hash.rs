use sha2::{Digest, Sha256};

/// Length of the hex suffix used in hash-style branch names.
pub const SHORT_HASH_LEN: usize = 8;

/// Compute SHA-256 hash of bytes, returning lowercase hex string.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// First [`SHORT_HASH_LEN`] hex characters of the SHA-256 of `seed`.
pub fn short_hash(seed: &str) -> String {
    let mut full = sha256_hex(seed.as_bytes());
    full.truncate(SHORT_HASH_LEN);
    full
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_empty() {
        let h = sha256_hex(b"");
        assert_eq!(
            h,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn short_hash_is_prefix_of_full_digest() {
        let h = short_hash("hello");
        assert_eq!(h, "2cf24dba");
        assert_eq!(h.len(), SHORT_HASH_LEN);
    }

    #[test]
    fn short_hash_is_stable() {
        assert_eq!(short_hash("Refactor auth"), short_hash("Refactor auth"));
        assert_ne!(short_hash("Refactor auth"), short_hash("Refactor db"));
    }
}
