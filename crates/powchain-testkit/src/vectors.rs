//! Golden test vectors for deterministic verification.
//!
//! These vectors pin the canonical encoding and the SHA-256 digest of fixed
//! block fields, so any implementation can check it hashes blocks the same
//! way.

use serde_json::{json, Value};

use powchain_core::{canonical_block_bytes, Block, BlockHash, Difficulty};

/// A golden test vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Block index.
    pub index: u64,
    /// Timestamp (Unix milliseconds).
    pub timestamp: i64,
    /// Payload.
    pub payload: Value,
    /// Previous hash (hex).
    pub previous_hash: &'static str,
    /// Nonce.
    pub nonce: u64,
    /// Expected canonical encoding.
    pub expected_canonical: &'static str,
    /// Expected block hash (hex).
    pub expected_hash: &'static str,
}

const ZERO_HEX: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "genesis at epoch",
            index: 0,
            timestamp: 0,
            payload: json!("Genesis Block"),
            previous_hash: ZERO_HEX,
            nonce: 0,
            expected_canonical: r#"{"index":0,"nonce":0,"payload":"Genesis Block","previous_hash":"0000000000000000000000000000000000000000000000000000000000000000","timestamp":0}"#,
            expected_hash: "44d15e93ab54b69e8de2e38e05cd302b0b6a632fb4e12dfbbf7718de119d8655",
        },
        GoldenVector {
            name: "genesis",
            index: 0,
            timestamp: 1736870400000, // 2025-01-14T16:00:00Z
            payload: json!("Genesis Block"),
            previous_hash: ZERO_HEX,
            nonce: 0,
            expected_canonical: r#"{"index":0,"nonce":0,"payload":"Genesis Block","previous_hash":"0000000000000000000000000000000000000000000000000000000000000000","timestamp":1736870400000}"#,
            expected_hash: "7a718994a2cb777dffb5477b509c5e1cf7f7f925a46d73096a7349e38cc6a841",
        },
        GoldenVector {
            name: "alice to bob, unmined",
            index: 1,
            timestamp: 1736870401000,
            payload: json!([{"from": "Alice", "to": "Bob", "amount": 50}]),
            previous_hash: "7a718994a2cb777dffb5477b509c5e1cf7f7f925a46d73096a7349e38cc6a841",
            nonce: 0,
            expected_canonical: r#"{"index":1,"nonce":0,"payload":[{"amount":50,"from":"Alice","to":"Bob"}],"previous_hash":"7a718994a2cb777dffb5477b509c5e1cf7f7f925a46d73096a7349e38cc6a841","timestamp":1736870401000}"#,
            expected_hash: "08db24e51d7937bf5007bcbf2b2edf0f5d74f79f3742d5779941116c0b3e50d5",
        },
        GoldenVector {
            name: "alice to bob, mined at difficulty 2",
            index: 1,
            timestamp: 1736870401000,
            payload: json!([{"from": "Alice", "to": "Bob", "amount": 50}]),
            previous_hash: "7a718994a2cb777dffb5477b509c5e1cf7f7f925a46d73096a7349e38cc6a841",
            nonce: 588,
            expected_canonical: r#"{"index":1,"nonce":588,"payload":[{"amount":50,"from":"Alice","to":"Bob"}],"previous_hash":"7a718994a2cb777dffb5477b509c5e1cf7f7f925a46d73096a7349e38cc6a841","timestamp":1736870401000}"#,
            expected_hash: "005cce16af7c652ce51715f132eb6a6e5ba48fac999290a5228793b9691c2ee6",
        },
        GoldenVector {
            name: "nested payload with escapes",
            index: 2,
            timestamp: 1736870402000,
            payload: json!({"z": {"b": [1, 2, null, true], "a": "line\nbreak"}, "a": "quote\"d"}),
            previous_hash: "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
            nonce: 42,
            expected_canonical: r#"{"index":2,"nonce":42,"payload":{"a":"quote\"d","z":{"a":"line\nbreak","b":[1,2,null,true]}},"previous_hash":"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa","timestamp":1736870402000}"#,
            expected_hash: "aad0637a90a0f89bc63ccbad77bf48ab0f11a3342df27dca3478e70c239597c7",
        },
        GoldenVector {
            name: "negative timestamp, max nonce",
            index: 7,
            timestamp: -1,
            payload: json!(12345),
            previous_hash: "1111111111111111111111111111111111111111111111111111111111111111",
            nonce: u64::MAX,
            expected_canonical: r#"{"index":7,"nonce":18446744073709551615,"payload":12345,"previous_hash":"1111111111111111111111111111111111111111111111111111111111111111","timestamp":-1}"#,
            expected_hash: "e18455752f2195b0998a87e9d597f9c3f03c60aab1d85cef5753d0196a897c88",
        },
    ]
}

/// Build the block described by a vector, with its hash computed.
pub fn block_from_vector(vector: &GoldenVector) -> Block {
    let previous_hash = BlockHash::from_hex(vector.previous_hash)
        .expect("vector previous_hash is 64 hex chars");
    let mut block = Block::seal(
        vector.index,
        vector.timestamp,
        vector.payload.clone(),
        previous_hash,
    );
    block.nonce = vector.nonce;
    block.recompute_hash();
    block
}

/// Check every vector. Returns `(name, matches, computed hash hex)` per vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .map(|v| {
            let block = block_from_vector(v);
            let canonical = canonical_block_bytes(
                block.index,
                block.timestamp,
                &block.payload,
                &block.previous_hash,
                block.nonce,
            );
            let hex = block.hash.to_hex();
            let matches =
                canonical == v.expected_canonical.as_bytes() && hex == v.expected_hash;
            (v.name.to_string(), matches, hex)
        })
        .collect()
}

/// The mined vector's nonce is the first one meeting this difficulty.
pub fn mined_vector_difficulty() -> Difficulty {
    Difficulty::new(2).unwrap_or(Difficulty::TRIVIAL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use powchain_core::{mine, GENESIS_PAYLOAD};

    #[test]
    fn test_previous_hashes_are_hex() {
        for v in all_vectors() {
            assert!(
                BlockHash::from_hex(v.previous_hash).is_ok(),
                "vector '{}' has a malformed previous_hash",
                v.name
            );
        }
    }

    #[test]
    fn test_all_vectors_match() {
        for (name, matches, hex) in verify_all_vectors() {
            assert!(matches, "vector '{}' mismatched, computed {}", name, hex);
        }
    }

    #[test]
    fn test_canonical_encodings_match() {
        for vector in all_vectors() {
            let block = block_from_vector(&vector);
            let canonical = canonical_block_bytes(
                block.index,
                block.timestamp,
                &block.payload,
                &block.previous_hash,
                block.nonce,
            );
            assert_eq!(
                String::from_utf8(canonical).unwrap(),
                vector.expected_canonical,
                "vector '{}'",
                vector.name
            );
        }
    }

    #[test]
    fn test_genesis_vectors_match_constructor() {
        let vectors = all_vectors();
        for vector in vectors.iter().filter(|v| v.index == 0) {
            let genesis = Block::genesis(vector.timestamp);
            assert_eq!(genesis.payload, json!(GENESIS_PAYLOAD));
            assert_eq!(genesis.hash.to_hex(), vector.expected_hash);
        }
    }

    #[test]
    fn test_mining_reproduces_mined_vector() {
        let vectors = all_vectors();
        let unmined = block_from_vector(&vectors[2]);
        let mined = mine(unmined, mined_vector_difficulty());

        assert_eq!(mined.nonce, vectors[3].nonce);
        assert_eq!(mined.hash.to_hex(), vectors[3].expected_hash);
    }

    #[test]
    fn test_vectors_chain_together() {
        let vectors = all_vectors();
        assert_eq!(vectors[2].previous_hash, vectors[1].expected_hash);
        assert_eq!(vectors[3].previous_hash, vectors[1].expected_hash);
    }
}
