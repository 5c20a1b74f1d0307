//! Cryptographic primitives: SHA-256 hashing.

use sha2::{Digest, Sha256};

use crate::types::BlockHash;

/// Compute the SHA-256 digest of data.
pub fn sha256(data: &[u8]) -> BlockHash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    BlockHash(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_answer() {
        // FIPS 180-2 test vector.
        assert_eq!(
            sha256(b"abc").to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_sha256_deterministic() {
        let h1 = sha256(b"test data");
        let h2 = sha256(b"test data");
        assert_eq!(h1, h2);
        assert_ne!(h1, sha256(b"different data"));
    }
}
