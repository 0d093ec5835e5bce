//! Wire protocol for the heat treatment device
//!
//! This crate defines the fixed 12-byte frames exchanged with the device over
//! its two bulk endpoints, the constants identifying the device, and the
//! validated request types. It performs no I/O.
//!
//! # Example
//!
//! ```
//! use protocol::{FRAME_SIZE, decode_status, encode_start_treatment};
//!
//! let frame = encode_start_treatment(2, 1).unwrap();
//! assert_eq!(&frame.as_bytes()[..4], &[0xFF, 0x08, 2, 1]);
//!
//! let response = [0xFF, 0x02, 0x00, 0x96, 0x1E, 0x1F, 0x01, 0x2C, 0x00, 0x00, 0x00, 0x00];
//! let status = decode_status(&response).unwrap();
//! assert_eq!(status.temperature, 150);
//! assert_eq!(status.pid, 300);
//! assert_eq!(response.len(), FRAME_SIZE);
//! ```

pub mod codec;
pub mod error;
pub mod types;

pub use codec::{
    CommandFrame, FRAME_HEADER, FRAME_SIZE, STATUS_CHECKSUM_PLACEHOLDER, StatusFrame,
    decode_status, encode_start_treatment, encode_status_query,
};
pub use error::{ProtocolError, Result};
pub use types::{
    CLAIMED_INTERFACES, DeviceIdentity, EndpointConfig, HEAT_DEVICE, HEAT_ENDPOINTS,
    MAX_TEMPERATURE_LEVEL, MAX_TIME_LEVEL, MessageType, REQUIRED_CONFIGURATION, TreatmentRequest,
};
