//! Protocol message types.
//!
//! Requests are single text lines (`ADD <payload>`, `MINE`, `CHAIN`,
//! `VALIDATE`, `LENGTH`). Every request gets exactly one JSON object back.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

use powchain_core::{encode_chain, Block, BlockHash};

use crate::error::{ProtocolError, Result};

/// Message size limits.
pub mod limits {
    /// Max bytes in one command line, excluding the terminator.
    pub const MAX_LINE_BYTES: usize = 1024 * 1024;
}

/// Command verbs, matched exactly.
pub mod verbs {
    pub const ADD: &str = "ADD";
    pub const MINE: &str = "MINE";
    pub const CHAIN: &str = "CHAIN";
    pub const VALIDATE: &str = "VALIDATE";
    pub const LENGTH: &str = "LENGTH";
}

/// What to do with an `ADD` argument that is not valid JSON.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadPolicy {
    /// Keep the raw text as a JSON string.
    #[default]
    Lenient,
    /// Reject the command.
    Strict,
}

impl PayloadPolicy {
    /// Turn raw argument text into a payload.
    pub fn decode(self, raw: &str) -> Result<Value> {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Ok(value),
            Err(e) => match self {
                PayloadPolicy::Lenient => Ok(Value::String(raw.to_string())),
                PayloadPolicy::Strict => Err(ProtocolError::MalformedPayload(e.to_string())),
            },
        }
    }
}

impl fmt::Display for PayloadPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadPolicy::Lenient => f.write_str("lenient"),
            PayloadPolicy::Strict => f.write_str("strict"),
        }
    }
}

impl FromStr for PayloadPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lenient" => Ok(PayloadPolicy::Lenient),
            "strict" => Ok(PayloadPolicy::Strict),
            other => Err(format!("unknown payload policy: {other} (expected lenient or strict)")),
        }
    }
}

/// A parsed request.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Stage a payload.
    Add(Value),
    /// Seal pending payloads into a block.
    Mine,
    /// Return the whole chain.
    Chain,
    /// Check chain validity.
    Validate,
    /// Return the number of blocks.
    Length,
}

impl Command {
    /// Parse one line (without its terminator).
    ///
    /// `ADD` takes everything after the first space as its argument.
    pub fn parse(line: &str, policy: PayloadPolicy) -> Result<Self> {
        let (verb, arg) = match line.split_once(' ') {
            Some((verb, arg)) => (verb, Some(arg)),
            None => (line, None),
        };

        match (verb, arg) {
            (verbs::ADD, Some(raw)) if !raw.trim().is_empty() => Ok(Command::Add(policy.decode(raw)?)),
            (verbs::ADD, _) => Err(ProtocolError::MissingArgument(verbs::ADD)),
            (verbs::MINE, None) => Ok(Command::Mine),
            (verbs::CHAIN, None) => Ok(Command::Chain),
            (verbs::VALIDATE, None) => Ok(Command::Validate),
            (verbs::LENGTH, None) => Ok(Command::Length),
            _ => Err(ProtocolError::UnknownCommand(line.to_string())),
        }
    }

    /// Render as a request line, terminator included.
    pub fn to_line(&self) -> String {
        match self {
            Command::Add(payload) => format!("{} {}\n", verbs::ADD, payload),
            Command::Mine => format!("{}\n", verbs::MINE),
            Command::Chain => format!("{}\n", verbs::CHAIN),
            Command::Validate => format!("{}\n", verbs::VALIDATE),
            Command::Length => format!("{}\n", verbs::LENGTH),
        }
    }
}

/// Response status field values.
pub mod status {
    pub const SUCCESS: &str = "success";
    pub const INFO: &str = "info";
    pub const ERROR: &str = "error";
}

/// A reply to one command.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Payload staged.
    Staged,
    /// A block was sealed.
    Mined { index: u64, hash: BlockHash },
    /// `MINE` with nothing pending.
    NothingToMine,
    /// The full chain.
    Chain(Vec<Block>),
    /// Validation result.
    Valid(bool),
    /// Chain length.
    Length(usize),
    /// Anything that went wrong.
    Error(String),
}

impl Response {
    /// Build an error response from any displayable error.
    pub fn error(err: impl fmt::Display) -> Self {
        Response::Error(err.to_string())
    }

    /// The JSON object sent on the wire.
    pub fn to_json(&self) -> Value {
        match self {
            Response::Staged => json!({ "status": status::SUCCESS }),
            Response::Mined { index, hash } => json!({
                "status": status::SUCCESS,
                "index": index,
                "hash": hash.to_hex(),
            }),
            Response::NothingToMine => json!({
                "status": status::INFO,
                "message": "nothing to mine",
            }),
            Response::Chain(chain) => json!({
                "status": status::SUCCESS,
                "chain": encode_chain(chain),
            }),
            Response::Valid(valid) => json!({ "status": status::SUCCESS, "valid": valid }),
            Response::Length(length) => json!({ "status": status::SUCCESS, "length": length }),
            Response::Error(message) => json!({ "status": status::ERROR, "message": message }),
        }
    }

    /// Render as a response line, terminator included.
    pub fn to_line(&self) -> String {
        let mut line = self.to_json().to_string();
        line.push('\n');
        line
    }

    /// Whether this is an error response.
    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error(_))
    }
}

impl From<ProtocolError> for Response {
    fn from(err: ProtocolError) -> Self {
        Response::error(err)
    }
}
