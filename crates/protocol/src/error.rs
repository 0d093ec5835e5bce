//! Protocol error types

use thiserror::Error;

/// Protocol-level errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// A treatment parameter is outside its accepted range
    #[error("Invalid {field} level {value} (max: {max})")]
    InvalidArgument {
        field: &'static str,
        value: u8,
        max: u8,
    },

    /// Response shorter than the fixed frame size
    #[error("Short frame: expected {expected} bytes, got {actual}")]
    ShortFrame { expected: usize, actual: usize },

    /// Byte that does not name a known message type
    #[error("Unknown message type {0:#04x}")]
    UnknownMessageType(u8),
}

/// Type alias for protocol results
pub type Result<T> = std::result::Result<T, ProtocolError>;
