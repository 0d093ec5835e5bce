//! Driver error types

use crate::usb::{SessionState, libusb_code};
use protocol::{DeviceIdentity, ProtocolError};
use std::fmt;
use thiserror::Error;

/// Direction of a bulk transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Device to host
    Read,
    /// Host to device
    Write,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Read => f.write_str("read"),
            Direction::Write => f.write_str("write"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DriverError {
    /// Invalid treatment argument or malformed response frame
    #[error(transparent)]
    Frame(#[from] ProtocolError),

    #[error("Failed to initialize USB context: {0}")]
    Context(#[source] rusb::Error),

    #[error("No USB device found with ID {identity}")]
    DeviceNotFound { identity: DeviceIdentity },

    #[error("Failed to open USB device {identity}: {source}")]
    Open {
        identity: DeviceIdentity,
        source: rusb::Error,
    },

    #[error("Failed to select configuration {value}: {source}")]
    Configuration { value: u8, source: rusb::Error },

    #[error("Session is {state}, transfers need a claimed session")]
    InvalidState { state: SessionState },

    /// Bulk transfer failure; timeouts share this variant
    #[error(
        "Bulk {direction} {}: {source} (libusb code {})",
        transfer_outcome(.source),
        libusb_code(.source)
    )]
    Transport {
        direction: Direction,
        source: rusb::Error,
    },
}

impl DriverError {
    /// True for a transfer that ran into its timeout
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            DriverError::Transport {
                source: rusb::Error::Timeout,
                ..
            }
        )
    }

    /// True for an out-of-range treatment parameter
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            DriverError::Frame(ProtocolError::InvalidArgument { .. })
        )
    }
}

fn transfer_outcome(err: &rusb::Error) -> &'static str {
    match err {
        rusb::Error::Timeout => "timed out",
        _ => "failed",
    }
}

pub type Result<T> = std::result::Result<T, DriverError>;
