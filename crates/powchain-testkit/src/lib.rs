//! # powchain testkit
//!
//! Testing utilities for powchain.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Fixed block fields with their expected canonical encoding and hash
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Deterministic ledgers, chains, and tamper helpers
//!
//! ## Golden Vectors
//!
//! Golden vectors pin canonical hashing across implementations:
//!
//! ```rust
//! use powchain_testkit::vectors::{all_vectors, block_from_vector};
//!
//! for vector in all_vectors() {
//!     let block = block_from_vector(&vector);
//!     assert_eq!(block.hash.to_hex(), vector.expected_hash);
//! }
//! ```
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use powchain_testkit::generators::{block_from_params, BlockParams};
//!
//! proptest! {
//!     #[test]
//!     fn block_hash_is_deterministic(params: BlockParams) {
//!         let b1 = block_from_params(&params);
//!         let b2 = block_from_params(&params);
//!         prop_assert_eq!(b1.hash, b2.hash);
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use powchain_testkit::fixtures;
//!
//! let ledger = fixtures::demo_ledger(1);
//! assert_eq!(ledger.len(), 3);
//! assert!(ledger.validate());
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{mined_chain, mined_ledger, Field, GENESIS_TS};
pub use generators::{block_from_params, BlockParams};
pub use vectors::{all_vectors, block_from_vector, verify_all_vectors, GoldenVector};
