//! Error types for the protocol module.

use thiserror::Error;

/// Errors that can occur while reading or parsing a command.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The verb is not part of the command set.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// A verb that needs an argument arrived without one.
    #[error("missing argument for {0}")]
    MissingArgument(&'static str),

    /// The payload is not valid JSON and the policy is strict.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// A line exceeded the framing limit.
    #[error("line exceeds {limit} bytes")]
    LineTooLong { limit: usize },

    /// A line was not valid UTF-8.
    #[error("line is not valid UTF-8")]
    InvalidUtf8,

    /// Underlying stream failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProtocolError {
    /// Whether the connection can keep going after this error.
    ///
    /// Framing and transport failures leave the stream in an unknown
    /// position, so the connection must be closed.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ProtocolError::LineTooLong { .. } | ProtocolError::Io(_))
    }
}

/// Result type for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;
