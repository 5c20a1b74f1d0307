//! Ledger: the ordered chain of sealed blocks plus the pending queue.
//!
//! The ledger is a plain value with no interior locking. It assumes a single
//! authoritative mutator; services wrap it in an actor or a lock (see the
//! `powchain` crate).
//!
//! Mining comes in two shapes:
//! - [`Ledger::mine_pending`] runs the whole search synchronously.
//! - [`Ledger::prepare_candidate`] + [`Ledger::commit`] split it so the
//!   search can run elsewhere (another thread, cancellable) while the
//!   ledger keeps accepting staged payloads.

use serde_json::Value;
use std::fmt;

use crate::block::{encode_chain, Block};
use crate::error::{CoreError, LedgerError, ValidationError};
use crate::fork::{resolve, ForkChoice};
use crate::pow::{mine, Difficulty};
use crate::validation::{validate_chain, validate_successor};

/// A block built from a snapshot of the pending queue, awaiting proof of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    block: Block,
    taken: usize,
}

impl Candidate {
    /// The unmined block (nonce 0).
    pub fn block(&self) -> &Block {
        &self.block
    }

    /// How many pending entries the block snapshotted.
    pub fn taken(&self) -> usize {
        self.taken
    }
}

/// The ledger engine.
#[derive(Debug, Clone)]
pub struct Ledger {
    chain: Vec<Block>,
    difficulty: Difficulty,
    pending: Vec<Value>,
}

impl Ledger {
    /// Create a ledger whose genesis is stamped with the current time.
    pub fn new(difficulty: Difficulty) -> Self {
        Self::new_at(difficulty, now_millis())
    }

    /// Create a ledger with an explicit genesis timestamp.
    pub fn new_at(difficulty: Difficulty, genesis_timestamp: i64) -> Self {
        Self {
            chain: vec![Block::genesis(genesis_timestamp)],
            difficulty,
            pending: Vec::new(),
        }
    }

    /// Create a ledger from a raw difficulty value.
    pub fn with_difficulty(zeros: u32) -> Result<Self, CoreError> {
        Ok(Self::new(Difficulty::new(zeros)?))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// The sealed blocks, genesis first.
    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    /// Number of sealed blocks (always at least 1).
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Always false: a ledger holds at least its genesis block.
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// The most recent sealed block.
    pub fn latest(&self) -> &Block {
        // The chain is never empty: constructors seed genesis and replace
        // only adopts validated (hence non-empty) chains.
        &self.chain[self.chain.len() - 1]
    }

    /// The genesis block.
    pub fn genesis(&self) -> &Block {
        &self.chain[0]
    }

    /// Payloads staged but not yet sealed.
    pub fn pending(&self) -> &[Value] {
        &self.pending
    }

    /// The difficulty every mined block must meet.
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// The chain as a JSON array of blocks.
    pub fn chain_data(&self) -> Value {
        encode_chain(&self.chain)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutation
    // ─────────────────────────────────────────────────────────────────────────

    /// Stage a payload for the next block. Returns the new pending length.
    pub fn stage(&mut self, payload: Value) -> usize {
        self.pending.push(payload);
        self.pending.len()
    }

    /// Seal all pending payloads into a new block, stamped with the current time.
    ///
    /// Returns `None` when there is nothing to mine.
    pub fn mine_pending(&mut self) -> Option<Block> {
        self.mine_pending_at(now_millis())
    }

    /// Like [`Ledger::mine_pending`] with an explicit timestamp.
    pub fn mine_pending_at(&mut self, timestamp: i64) -> Option<Block> {
        let candidate = self.prepare_candidate(timestamp)?;
        let sealed = mine(candidate.block.clone(), self.difficulty);
        // The tip cannot move while we hold &mut self.
        debug_assert!(validate_successor(self.latest(), &sealed, self.difficulty).is_ok());
        Some(self.append(candidate.taken, sealed))
    }

    /// Snapshot the pending queue into an unmined block on top of the tip.
    ///
    /// The ledger itself is not modified. Returns `None` when nothing is
    /// pending.
    pub fn prepare_candidate(&self, timestamp: i64) -> Option<Candidate> {
        if self.pending.is_empty() {
            return None;
        }

        let block = Block::seal(
            self.chain.len() as u64,
            timestamp,
            Value::Array(self.pending.clone()),
            self.latest().hash,
        );

        Some(Candidate {
            block,
            taken: self.pending.len(),
        })
    }

    /// Append a mined candidate and drain the entries it snapshotted.
    ///
    /// Entries staged after the snapshot stay pending. Nothing changes on
    /// error.
    pub fn commit(&mut self, candidate: &Candidate, sealed: Block) -> Result<Block, LedgerError> {
        let tip = self.latest().hash;
        if candidate.block.previous_hash != tip || candidate.block.index != self.chain.len() as u64 {
            return Err(LedgerError::StaleCandidate {
                expected: candidate.block.previous_hash,
                actual: tip,
            });
        }

        let expected = &candidate.block;
        if sealed.index != expected.index
            || sealed.timestamp != expected.timestamp
            || sealed.payload != expected.payload
            || sealed.previous_hash != expected.previous_hash
            || candidate.taken > self.pending.len()
        {
            return Err(LedgerError::CandidateMismatch);
        }

        validate_successor(self.latest(), &sealed, self.difficulty)?;

        Ok(self.append(candidate.taken, sealed))
    }

    fn append(&mut self, taken: usize, sealed: Block) -> Block {
        self.pending.drain(..taken);
        self.chain.push(sealed.clone());
        sealed
    }

    /// Replace the chain with `candidate` if it is strictly longer and valid.
    ///
    /// Returns whether the candidate was adopted. Never partially adopts.
    pub fn replace(&mut self, candidate: Vec<Block>) -> bool {
        self.replace_chain(candidate).is_adopt()
    }

    /// Like [`Ledger::replace`], reporting why a candidate was rejected.
    pub fn replace_chain(&mut self, candidate: Vec<Block>) -> ForkChoice {
        let choice = resolve(&self.chain, &candidate, self.difficulty);
        if choice.is_adopt() {
            self.chain = candidate;
        }
        choice
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Validation
    // ─────────────────────────────────────────────────────────────────────────

    /// Whether every chain invariant holds.
    pub fn validate(&self) -> bool {
        self.check().is_ok()
    }

    /// Validate the chain, naming the first violation.
    pub fn check(&self) -> Result<(), ValidationError> {
        validate_chain(&self.chain, self.difficulty)
    }
}

impl fmt::Display for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string_pretty(&self.chain_data()).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

/// Get current time in milliseconds.
pub fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
