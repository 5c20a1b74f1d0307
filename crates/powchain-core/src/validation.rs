//! Chain validation: hash integrity, links and proof of work.

use crate::block::Block;
use crate::error::ValidationError;
use crate::pow::Difficulty;

/// Validate an entire chain against a difficulty.
///
/// This performs:
/// - Non-empty check and index-equals-position check
/// - Genesis shape and hash integrity (genesis is exempt from proof of work)
/// - For every later block: hash integrity, link to predecessor, proof of work
///
/// Returns the first violation found.
pub fn validate_chain(chain: &[Block], difficulty: Difficulty) -> Result<(), ValidationError> {
    let genesis = chain.first().ok_or(ValidationError::EmptyChain)?;
    validate_genesis(genesis)?;

    for (position, pair) in chain.windows(2).enumerate() {
        let (previous, block) = (&pair[0], &pair[1]);
        check_index(block, position as u64 + 1)?;
        validate_successor(previous, block, difficulty)?;
    }

    Ok(())
}

/// Boolean form of [`validate_chain`].
pub fn is_valid_chain(chain: &[Block], difficulty: Difficulty) -> bool {
    validate_chain(chain, difficulty).is_ok()
}

/// Validate the first block of a chain.
///
/// Genesis is never mined, so it is not held to the difficulty. Its stored
/// hash must still match its fields.
pub fn validate_genesis(genesis: &Block) -> Result<(), ValidationError> {
    check_index(genesis, 0)?;
    if !genesis.is_genesis() {
        return Err(ValidationError::InvalidGenesis);
    }
    check_integrity(genesis)
}

/// Validate one block against its predecessor.
pub fn validate_successor(
    previous: &Block,
    block: &Block,
    difficulty: Difficulty,
) -> Result<(), ValidationError> {
    // 1. Stored hash matches recomputed
    check_integrity(block)?;

    // 2. Links to predecessor
    if block.previous_hash != previous.hash {
        return Err(ValidationError::BrokenLink {
            index: block.index,
            expected: previous.hash,
            got: block.previous_hash,
        });
    }

    // 3. Proof of work
    if !difficulty.is_met_by(&block.hash) {
        return Err(ValidationError::InsufficientWork {
            index: block.index,
            hash: block.hash,
            difficulty: difficulty.get(),
        });
    }

    Ok(())
}

fn check_index(block: &Block, position: u64) -> Result<(), ValidationError> {
    if block.index != position {
        return Err(ValidationError::IndexMismatch {
            position,
            index: block.index,
        });
    }
    Ok(())
}

fn check_integrity(block: &Block) -> Result<(), ValidationError> {
    let computed = block.compute_hash();
    if computed != block.hash {
        return Err(ValidationError::HashMismatch {
            index: block.index,
            stored: block.hash,
            computed,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pow::mine;
    use crate::types::BlockHash;
    use serde_json::json;

    fn d(n: u32) -> Difficulty {
        Difficulty::new(n).unwrap()
    }

    fn build_chain(difficulty: Difficulty, blocks: u64) -> Vec<Block> {
        let mut chain = vec![Block::genesis(1736870400000)];
        for i in 1..=blocks {
            let prev = chain.last().unwrap().hash;
            let candidate = Block::seal(i, 1736870400000 + i as i64, json!([format!("entry {}", i)]), prev);
            chain.push(mine(candidate, difficulty));
        }
        chain
    }

    #[test]
    fn test_genesis_only_is_valid() {
        let chain = build_chain(d(2), 0);
        assert!(validate_chain(&chain, d(2)).is_ok());
    }

    #[test]
    fn test_genesis_exempt_from_difficulty() {
        // Genesis hash almost surely fails difficulty 8, yet the chain is valid.
        let chain = build_chain(d(1), 1);
        assert!(!d(8).is_met_by(&chain[0].hash));
        assert!(validate_chain(&chain[..1], d(8)).is_ok());
    }

    #[test]
    fn test_mined_chain_is_valid() {
        let chain = build_chain(d(2), 3);
        assert!(is_valid_chain(&chain, d(2)));
    }

    #[test]
    fn test_empty_chain() {
        assert_eq!(validate_chain(&[], d(0)), Err(ValidationError::EmptyChain));
    }

    #[test]
    fn test_tampered_payload_detected() {
        let mut chain = build_chain(d(1), 2);
        chain[1].payload = json!(["forged"]);
        assert!(matches!(
            validate_chain(&chain, d(1)),
            Err(ValidationError::HashMismatch { index: 1, .. })
        ));
    }

    #[test]
    fn test_rehashed_tamper_breaks_link() {
        let mut chain = build_chain(d(1), 2);
        chain[1].payload = json!(["forged"]);
        chain[1] = mine(chain[1].clone(), d(1));

        assert!(matches!(
            validate_chain(&chain, d(1)),
            Err(ValidationError::BrokenLink { index: 2, .. })
        ));
    }

    #[test]
    fn test_insufficient_work_detected() {
        let chain = build_chain(d(0), 1);
        // With difficulty 0 the first nonce is kept; demanding 64 zeros must fail.
        assert!(matches!(
            validate_chain(&chain, d(64)),
            Err(ValidationError::InsufficientWork { index: 1, difficulty: 64, .. })
        ));
    }

    #[test]
    fn test_tampered_genesis_detected() {
        let mut chain = build_chain(d(1), 1);
        chain[0].timestamp += 1;
        assert!(matches!(
            validate_chain(&chain, d(1)),
            Err(ValidationError::HashMismatch { index: 0, .. })
        ));
    }

    #[test]
    fn test_non_genesis_first_block_rejected() {
        let block = Block::seal(0, 1, json!("not genesis"), BlockHash::ZERO);
        assert_eq!(validate_chain(&[block], d(0)), Err(ValidationError::InvalidGenesis));
    }

    #[test]
    fn test_index_gap_rejected() {
        let mut chain = build_chain(d(0), 2);
        chain.remove(1);
        assert!(matches!(
            validate_chain(&chain, d(0)),
            Err(ValidationError::IndexMismatch { position: 1, index: 2 })
        ));
    }
}
