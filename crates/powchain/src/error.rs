//! Error types for the node.

use powchain_core::{CoreError, LedgerError};
use powchain_protocol::ProtocolError;
use thiserror::Error;

/// Errors that can occur during node operations.
#[derive(Debug, Error)]
pub enum NodeError {
    /// An in-flight mine was cancelled.
    #[error("mining cancelled")]
    Cancelled,

    /// The node stopped before the request could run.
    #[error("node is shutting down")]
    ShuttingDown,

    /// The ledger actor is gone.
    #[error("ledger actor is not running")]
    ActorGone,

    /// The peer closed the connection before answering.
    #[error("node closed the connection without replying")]
    NoReply,

    /// The mining task died without a result.
    #[error("mining task failed: {0}")]
    MiningFailed(String),

    /// A mined block could not be committed.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Invalid core parameters.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Protocol error.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Socket or listener failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for node operations.
pub type Result<T> = std::result::Result<T, NodeError>;
