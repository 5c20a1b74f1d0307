//! Proof of work: the difficulty predicate and the nonce search.
//!
//! The search is an unbounded linear scan from the block's current nonce.
//! Expected cost is 16^difficulty attempts, which makes it the dominant cost
//! center of the engine. Splitting the nonce space across workers would be
//! the natural place to parallelize; the scan here is single-threaded and
//! deterministic: the same starting block and difficulty always yield the
//! same nonce.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::block::Block;
use crate::error::CoreError;
use crate::types::BlockHash;

/// Highest meaningful difficulty: a SHA-256 digest has 64 hex characters.
pub const MAX_DIFFICULTY: u32 = 64;

/// How many attempts a cancellable search makes between flag checks.
pub const CANCEL_POLL_INTERVAL: u64 = 1024;

/// Number of leading `'0'` hex characters a valid block hash must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Difficulty(u32);

impl Difficulty {
    /// Create a difficulty, rejecting values no digest can satisfy.
    pub fn new(zeros: u32) -> Result<Self, CoreError> {
        Self::checked(zeros).ok_or(CoreError::InvalidDifficulty(zeros))
    }

    /// Const form of [`Difficulty::new`], usable in constant definitions.
    pub const fn checked(zeros: u32) -> Option<Self> {
        if zeros > MAX_DIFFICULTY {
            None
        } else {
            Some(Self(zeros))
        }
    }

    /// Difficulty 0: every hash qualifies.
    pub const TRIVIAL: Self = Self(0);

    /// The number of required leading zeros.
    pub const fn get(self) -> u32 {
        self.0
    }

    /// The difficulty predicate.
    pub fn is_met_by(self, hash: &BlockHash) -> bool {
        hash.leading_zero_nibbles() >= self.0
    }

    /// The required hex prefix, e.g. `"0000"` for difficulty 4.
    pub fn target_prefix(self) -> String {
        "0".repeat(self.0 as usize)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for Difficulty {
    type Error = CoreError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Difficulty> for u32 {
    fn from(d: Difficulty) -> Self {
        d.0
    }
}

/// Shared flag used to stop an in-flight search.
///
/// Cloning shares the flag. Once raised it stays raised.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create a new, lowered flag.
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Ask every search watching this flag to stop.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Search for a nonce that makes `block` meet `difficulty`.
///
/// Starts from the block's current nonce. Index, timestamp, payload and
/// previous hash are left untouched.
pub fn mine(mut block: Block, difficulty: Difficulty) -> Block {
    block.recompute_hash();
    while !difficulty.is_met_by(&block.hash) {
        block.nonce = block.nonce.wrapping_add(1);
        block.recompute_hash();
    }
    block
}

/// Like [`mine`], but gives up when `cancel` is raised.
///
/// Returns `None` on cancellation. The input block is consumed either way,
/// so no partially mined state can leak back to the caller.
pub fn mine_cancellable(
    mut block: Block,
    difficulty: Difficulty,
    cancel: &CancelFlag,
) -> Option<Block> {
    block.recompute_hash();
    let mut attempts: u64 = 0;
    while !difficulty.is_met_by(&block.hash) {
        if attempts % CANCEL_POLL_INTERVAL == 0 && cancel.is_cancelled() {
            return None;
        }
        attempts += 1;
        block.nonce = block.nonce.wrapping_add(1);
        block.recompute_hash();
    }
    Some(block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn candidate() -> Block {
        Block::seal(1, 1736870400000, json!([{"k": "v"}]), BlockHash([0x11; 32]))
    }

    #[test]
    fn test_difficulty_bounds() {
        assert!(Difficulty::new(0).is_ok());
        assert!(Difficulty::new(64).is_ok());
        assert!(matches!(
            Difficulty::new(65),
            Err(CoreError::InvalidDifficulty(65))
        ));
        assert_eq!(Difficulty::checked(64), Some(Difficulty(64)));
        assert_eq!(Difficulty::checked(65), None);
    }

    #[test]
    fn test_predicate_matches_hex_prefix() {
        let d = Difficulty::new(3).unwrap();
        let mut bytes = [0xffu8; 32];
        bytes[0] = 0x00;
        bytes[1] = 0x0a;
        let hash = BlockHash(bytes);
        assert!(hash.to_hex().starts_with(&d.target_prefix()));
        assert!(d.is_met_by(&hash));

        bytes[1] = 0xa0;
        assert!(!d.is_met_by(&BlockHash(bytes)));
    }

    #[test]
    fn test_trivial_difficulty_accepts_initial_nonce() {
        let mined = mine(candidate(), Difficulty::TRIVIAL);
        assert_eq!(mined.nonce, 0);
    }

    #[test]
    fn test_mine_meets_difficulty() {
        let d = Difficulty::new(2).unwrap();
        let original = candidate();
        let mined = mine(original.clone(), d);

        assert!(mined.hash.to_hex().starts_with("00"));
        assert!(mined.is_intact());
        assert_eq!(mined.index, original.index);
        assert_eq!(mined.timestamp, original.timestamp);
        assert_eq!(mined.payload, original.payload);
        assert_eq!(mined.previous_hash, original.previous_hash);
    }

    #[test]
    fn test_mine_is_deterministic() {
        let d = Difficulty::new(2).unwrap();
        let a = mine(candidate(), d);
        let b = mine(candidate(), d);
        assert_eq!(a.nonce, b.nonce);
        assert_eq!(a.hash, b.hash);
    }

    #[test]
    fn test_mine_finds_first_qualifying_nonce() {
        let d = Difficulty::new(1).unwrap();
        let mined = mine(candidate(), d);

        let mut probe = candidate();
        for nonce in 0..mined.nonce {
            probe.nonce = nonce;
            assert!(!d.is_met_by(&probe.compute_hash()));
        }
    }

    #[test]
    fn test_cancellable_matches_plain_search() {
        let d = Difficulty::new(2).unwrap();
        let flag = CancelFlag::new();
        let a = mine_cancellable(candidate(), d, &flag).unwrap();
        let b = mine(candidate(), d);
        assert_eq!(a, b);
    }

    #[test]
    fn test_cancelled_search_returns_none() {
        let flag = CancelFlag::new();
        flag.cancel();
        let result = mine_cancellable(candidate(), Difficulty::new(64).unwrap(), &flag);
        assert!(result.is_none());
    }

    #[test]
    fn test_difficulty_serde() {
        let d: Difficulty = serde_json::from_str("4").unwrap();
        assert_eq!(d.get(), 4);
        assert!(serde_json::from_str::<Difficulty>("99").is_err());
    }
}
