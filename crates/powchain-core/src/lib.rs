//! # powchain core
//!
//! Pure primitives for powchain: blocks, canonical hashing, proof of work,
//! chain validation, and fork resolution.
//!
//! This crate contains no I/O, no storage, no networking. It is pure computation
//! over hash-linked blocks.
//!
//! ## Key Types
//!
//! - [`Block`] - A sealed record holding an arbitrary JSON payload
//! - [`BlockHash`] - SHA-256 digest of a block's canonical encoding
//! - [`Difficulty`] - Required number of leading zero hex characters
//! - [`Ledger`] - The chain plus its pending queue
//!
//! ## Canonicalization
//!
//! Block hashes cover a sorted-key, compact JSON encoding of the block fields.
//! See [`canonical`] module.

pub mod block;
pub mod canonical;
pub mod crypto;
pub mod error;
pub mod fork;
pub mod ledger;
pub mod pow;
pub mod types;
pub mod validation;

pub use block::{decode_chain, encode_chain, Block, GENESIS_PAYLOAD};
pub use canonical::{block_digest, canonical_block_bytes, canonical_json};
pub use crypto::sha256;
pub use error::{CoreError, LedgerError, ValidationError};
pub use fork::{resolve, ForkChoice, Rejection};
pub use ledger::{now_millis, Candidate, Ledger};
pub use pow::{mine, mine_cancellable, CancelFlag, Difficulty, MAX_DIFFICULTY};
pub use types::BlockHash;
pub use validation::{is_valid_chain, validate_chain, validate_genesis, validate_successor};
