//! Error types for powchain core.

use thiserror::Error;

use crate::types::BlockHash;

/// Core errors that can occur while building or decoding blocks.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("difficulty {0} exceeds the 64 hex characters of a digest")]
    InvalidDifficulty(u32),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}

/// The first violation found while validating a chain.
///
/// Never fatal: an invalid candidate chain is an expected outcome of fork
/// resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("chain is empty")]
    EmptyChain,

    #[error("block at position {position} claims index {index}")]
    IndexMismatch { position: u64, index: u64 },

    #[error("first block is not a genesis block")]
    InvalidGenesis,

    #[error("block {index}: stored hash {stored} does not match computed {computed}")]
    HashMismatch {
        index: u64,
        stored: BlockHash,
        computed: BlockHash,
    },

    #[error("block {index}: previous_hash {got} does not link to {expected}")]
    BrokenLink {
        index: u64,
        expected: BlockHash,
        got: BlockHash,
    },

    #[error("block {index}: hash {hash} does not meet difficulty {difficulty}")]
    InsufficientWork {
        index: u64,
        hash: BlockHash,
        difficulty: u32,
    },
}

/// Errors from committing a mined candidate to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("chain tip moved since the candidate was prepared (expected {expected}, now {actual})")]
    StaleCandidate {
        expected: BlockHash,
        actual: BlockHash,
    },

    #[error("sealed block does not match the prepared candidate")]
    CandidateMismatch,

    #[error("sealed block is invalid: {0}")]
    InvalidBlock(#[from] ValidationError),
}
