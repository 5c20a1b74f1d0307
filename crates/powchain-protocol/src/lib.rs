//! # powchain protocol
//!
//! The line-oriented command protocol spoken by powchain nodes.
//!
//! ## Overview
//!
//! A client sends one command per line and reads one JSON object per line
//! back. A connection can carry any number of exchanges.
//!
//! ## Message Flow
//!
//! ```text
//! Client                                Node
//!   |-- ADD {"from":"Alice"} ----------->|
//!   |<- {"status":"success"} ------------|
//!   |-- MINE --------------------------->|
//!   |<- {"status":"success","index":1,...}
//!   |-- VALIDATE ----------------------->|
//!   |<- {"status":"success","valid":true}|
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use powchain_protocol::{Command, PayloadPolicy, Response};
//!
//! let cmd = Command::parse("LENGTH", PayloadPolicy::Lenient).unwrap();
//! assert_eq!(cmd, Command::Length);
//! assert_eq!(Response::Length(1).to_json()["length"], 1);
//! ```

pub mod error;
pub mod framing;
pub mod messages;

pub use error::{ProtocolError, Result};
pub use framing::{write_response, LineReader};
pub use messages::{limits, status, verbs, Command, PayloadPolicy, Response};
