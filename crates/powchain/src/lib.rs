//! # powchain
//!
//! A tamper-evident, append-only ledger secured by proof of work, served
//! over a line-oriented TCP protocol.
//!
//! ## Overview
//!
//! - **Blocks**: Arbitrary JSON payloads sealed with a SHA-256 hash
//! - **Proof of work**: Every mined hash starts with `difficulty` zero hex characters
//! - **Validation**: Any edit to a sealed block breaks its hash or the next link
//! - **Fork resolution**: A strictly longer, fully valid chain replaces ours
//!
//! ## Usage
//!
//! ```rust,no_run
//! use powchain::{LedgerHandle, Ledger, Difficulty};
//! use serde_json::json;
//!
//! async fn example() -> powchain::Result<()> {
//!     let ledger = Ledger::new(Difficulty::new(2)?);
//!     let handle = LedgerHandle::spawn(ledger, 64);
//!
//!     handle.stage(json!({"from": "Alice", "to": "Bob", "amount": 50})).await?;
//!     let block = handle.mine().await?.expect("one payload was pending");
//!     assert!(block.hash.to_hex().starts_with("00"));
//!     assert!(handle.validate().await?);
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `powchain::core` - Blocks, hashing, proof of work, validation, the ledger
//! - `powchain::protocol` - Command parsing, responses, line framing

pub mod client;
pub mod config;
pub mod error;
pub mod node;
pub mod server;

// Re-export component crates
pub use powchain_core as core;
pub use powchain_protocol as protocol;

// Re-export main types for convenience
pub use client::request;
pub use config::NodeConfig;
pub use error::{NodeError, Result};
pub use node::{LedgerHandle, NodeStatus};
pub use server::{execute, Server};

// Re-export commonly used core types
pub use powchain_core::{Block, BlockHash, Difficulty, ForkChoice, Ledger};
pub use powchain_protocol::{Command, PayloadPolicy, Response};
