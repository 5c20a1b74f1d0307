//! Test fixtures and helpers.
//!
//! Deterministic ledgers and chains for unit and integration tests. Every
//! builder takes explicit timestamps so the resulting hashes are stable.

use serde_json::{json, Value};

use powchain_core::{mine, Block, Difficulty, Ledger};

/// Genesis timestamp used by fixtures (2025-01-14T16:00:00Z).
pub const GENESIS_TS: i64 = 1736870400000;

/// A difficulty known to be in range.
///
/// # Panics
///
/// Panics if `zeros` exceeds the maximum difficulty.
pub fn difficulty(zeros: u32) -> Difficulty {
    Difficulty::new(zeros).expect("fixture difficulty in range")
}

/// The three transfers of the demo scenario, in staging order.
pub fn transfers() -> Vec<Value> {
    vec![
        json!({"from": "Alice", "to": "Bob", "amount": 50}),
        json!({"from": "Bob", "to": "Charlie", "amount": 25}),
        json!({"from": "Charlie", "to": "Alice", "amount": 10}),
    ]
}

/// A fresh ledger with a fixed genesis timestamp.
pub fn ledger(zeros: u32) -> Ledger {
    Ledger::new_at(difficulty(zeros), GENESIS_TS)
}

/// A ledger with `blocks` mined blocks, each holding `{"seq": i}`.
pub fn mined_ledger(zeros: u32, blocks: usize) -> Ledger {
    let mut ledger = ledger(zeros);
    for i in 1..=blocks {
        ledger.stage(json!({ "seq": i }));
        ledger.mine_pending_at(GENESIS_TS + i as i64 * 1000);
    }
    ledger
}

/// The demo scenario: two transfers in block 1, one in block 2.
pub fn demo_ledger(zeros: u32) -> Ledger {
    let mut ledger = ledger(zeros);
    let mut transfers = transfers().into_iter();

    for payload in transfers.by_ref().take(2) {
        ledger.stage(payload);
    }
    ledger.mine_pending_at(GENESIS_TS + 1000);

    for payload in transfers {
        ledger.stage(payload);
    }
    ledger.mine_pending_at(GENESIS_TS + 2000);
    ledger
}

/// A valid chain of `blocks` mined blocks on a genesis at `genesis_ts`.
///
/// Distinct `genesis_ts` values give unrelated chains.
pub fn mined_chain(zeros: u32, genesis_ts: i64, blocks: usize) -> Vec<Block> {
    let difficulty = difficulty(zeros);
    let mut chain = vec![Block::genesis(genesis_ts)];
    for i in 1..=blocks {
        let previous = chain[i - 1].hash;
        let candidate = Block::seal(i as u64, genesis_ts + i as i64, json!([i]), previous);
        chain.push(mine(candidate, difficulty));
    }
    chain
}

/// Field to corrupt in a sealed block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Index,
    Timestamp,
    Payload,
    PreviousHash,
    Nonce,
}

impl Field {
    /// Every hashed field.
    pub const ALL: [Field; 5] = [
        Field::Index,
        Field::Timestamp,
        Field::Payload,
        Field::PreviousHash,
        Field::Nonce,
    ];
}

/// Change one field of `chain[index]` without touching its stored hash.
pub fn tamper(chain: &mut [Block], index: usize, field: Field) {
    let block = &mut chain[index];
    match field {
        Field::Index => block.index = block.index.wrapping_add(1),
        Field::Timestamp => block.timestamp = block.timestamp.wrapping_add(1),
        Field::Payload => block.payload = json!(["tampered"]),
        Field::PreviousHash => block.previous_hash.0[0] ^= 0xff,
        Field::Nonce => block.nonce = block.nonce.wrapping_add(1),
    }
}

/// Change a block's payload and re-mine it so its own hash is consistent.
///
/// The next block's link then points at the old hash.
pub fn tamper_and_remine(chain: &mut [Block], index: usize, zeros: u32) {
    chain[index].payload = json!(["tampered"]);
    chain[index] = mine(chain[index].clone(), difficulty(zeros));
}
