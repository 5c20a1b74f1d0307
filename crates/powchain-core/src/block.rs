//! Block: one sealed record in the ledger.
//!
//! A block's `hash` is always derived from its other fields. Nothing in this
//! module trusts a stored hash; callers that receive blocks from outside use
//! [`Block::is_intact`] or the chain validator.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::canonical::block_digest;
use crate::error::CoreError;
use crate::types::BlockHash;

/// Payload marker carried by every genesis block.
pub const GENESIS_PAYLOAD: &str = "Genesis Block";

/// A block in the chain.
///
/// Field order here is the wire order used by `CHAIN` responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Position in the chain (genesis = 0).
    pub index: u64,

    /// When the block was sealed (Unix milliseconds). Not validated.
    pub timestamp: i64,

    /// Opaque application data. Never interpreted.
    pub payload: Value,

    /// Hash of the preceding block ([`BlockHash::ZERO`] for genesis).
    pub previous_hash: BlockHash,

    /// Proof-of-work counter.
    pub nonce: u64,

    /// Digest of the fields above.
    pub hash: BlockHash,
}

impl Block {
    /// Build a block with `nonce = 0` and its hash computed.
    ///
    /// This is the pre-mining state; the hash will generally not satisfy any
    /// nontrivial difficulty yet.
    pub fn seal(index: u64, timestamp: i64, payload: Value, previous_hash: BlockHash) -> Self {
        let mut block = Self {
            index,
            timestamp,
            payload,
            previous_hash,
            nonce: 0,
            hash: BlockHash::ZERO,
        };
        block.recompute_hash();
        block
    }

    /// Build the fixed genesis block. It is never mined.
    pub fn genesis(timestamp: i64) -> Self {
        Self::seal(0, timestamp, Value::String(GENESIS_PAYLOAD.into()), BlockHash::ZERO)
    }

    /// Compute the digest of the current field values.
    pub fn compute_hash(&self) -> BlockHash {
        block_digest(
            self.index,
            self.timestamp,
            &self.payload,
            &self.previous_hash,
            self.nonce,
        )
    }

    /// Re-derive `hash` from the current field values.
    pub fn recompute_hash(&mut self) {
        self.hash = self.compute_hash();
    }

    /// Whether the stored hash matches the recomputed one.
    pub fn is_intact(&self) -> bool {
        self.hash == self.compute_hash()
    }

    /// Whether this block has the shape of a genesis block.
    pub fn is_genesis(&self) -> bool {
        self.index == 0
            && self.previous_hash == BlockHash::ZERO
            && self.payload.as_str() == Some(GENESIS_PAYLOAD)
    }

    /// Serialize to a JSON value (all six fields).
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "index": self.index,
            "timestamp": self.timestamp,
            "payload": self.payload,
            "previous_hash": self.previous_hash,
            "nonce": self.nonce,
            "hash": self.hash,
        })
    }

    /// Reconstruct from a JSON value.
    ///
    /// The stored hash is taken as-is and NOT verified.
    pub fn from_json(value: Value) -> Result<Self, CoreError> {
        serde_json::from_value(value).map_err(|e| CoreError::DecodingError(e.to_string()))
    }
}

/// Decode a serialized chain (a JSON array of blocks) without verifying it.
pub fn decode_chain(json: &str) -> Result<Vec<Block>, CoreError> {
    serde_json::from_str(json).map_err(|e| CoreError::DecodingError(e.to_string()))
}

/// Encode a chain as a JSON array of blocks.
pub fn encode_chain(chain: &[Block]) -> Value {
    Value::Array(chain.iter().map(Block::to_json).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_seal_starts_at_nonce_zero() {
        let block = Block::seal(1, 1736870400000, json!(["a"]), BlockHash([7; 32]));
        assert_eq!(block.nonce, 0);
        assert!(block.is_intact());
    }

    #[test]
    fn test_genesis_shape() {
        let genesis = Block::genesis(42);
        assert!(genesis.is_genesis());
        assert_eq!(genesis.previous_hash, BlockHash::ZERO);
        assert_eq!(genesis.payload, json!("Genesis Block"));
        assert!(genesis.is_intact());
    }

    #[test]
    fn test_recompute_after_nonce_change() {
        let mut block = Block::seal(1, 10, json!("x"), BlockHash::ZERO);
        let before = block.hash;

        block.nonce += 1;
        assert!(!block.is_intact());

        block.recompute_hash();
        assert!(block.is_intact());
        assert_ne!(block.hash, before);
    }

    #[test]
    fn test_json_roundtrip_preserves_all_fields() {
        let mut block = Block::seal(
            3,
            1736870400123,
            json!([{"from": "Alice", "to": "Bob", "amount": 50}, "note", 1.5, null]),
            BlockHash([0xaa; 32]),
        );
        block.nonce = 991;
        block.recompute_hash();

        let text = serde_json::to_string(&block).unwrap();
        let back: Block = serde_json::from_str(&text).unwrap();
        assert_eq!(back, block);
        assert_eq!(serde_json::to_string(&back).unwrap(), text);

        let via_value = Block::from_json(block.to_json()).unwrap();
        assert_eq!(via_value, block);
    }

    #[test]
    fn test_decode_does_not_verify_hash() {
        let mut value = Block::genesis(1).to_json();
        value["hash"] = json!("ff".repeat(32));

        let block = Block::from_json(value).unwrap();
        assert!(!block.is_intact());
    }

    #[test]
    fn test_decode_rejects_missing_field() {
        let mut value = Block::genesis(1).to_json();
        value.as_object_mut().unwrap().remove("nonce");
        assert!(matches!(Block::from_json(value), Err(CoreError::DecodingError(_))));
    }

    #[test]
    fn test_chain_encode_decode() {
        let chain = vec![Block::genesis(1), Block::seal(1, 2, json!([1]), BlockHash([3; 32]))];
        let text = encode_chain(&chain).to_string();
        assert_eq!(decode_chain(&text).unwrap(), chain);
    }
}
