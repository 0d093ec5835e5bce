//! Frame encoding and decoding
//!
//! Every message exchanged with the device is exactly [`FRAME_SIZE`] bytes.
//!
//! # Frame Format
//!
//! ```text
//! offset  status query    status response      start treatment
//! 0       0xFF            0xFF                 0xFF
//! 1       0x02            message type         0x08
//! 2       0x01 (chksum)   temperature (hi)     temperature level
//! 3       0               temperature (lo)     time level
//! 4       0               internal sensor      0
//! 5       0               external sensor      0
//! 6..=7   0               PID (big-endian)     0
//! 8       0               checksum             0
//! 9..=11  0               reserved             0
//! ```
//!
//! The response checksum is carried through unchanged and not verified.

use crate::error::{ProtocolError, Result};
use crate::types::{MessageType, TreatmentRequest};
use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};

/// Size of every frame in bytes
pub const FRAME_SIZE: usize = 12;

/// Header byte starting every frame
pub const FRAME_HEADER: u8 = 0xFF;

/// Fixed value sent in the checksum slot of a status query
pub const STATUS_CHECKSUM_PLACEHOLDER: u8 = 0x01;

/// Outbound command frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandFrame([u8; FRAME_SIZE]);

impl CommandFrame {
    /// Build a frame from its message type and payload bytes
    ///
    /// Bytes after the payload stay zero.
    fn new(msg_type: MessageType, payload: &[u8]) -> Self {
        let mut bytes = [0u8; FRAME_SIZE];
        let mut buf = &mut bytes[..];
        buf.put_u8(FRAME_HEADER);
        buf.put_u8(msg_type.into());
        buf.put_slice(payload);
        Self(bytes)
    }

    /// Frame for a validated treatment request
    pub fn start_treatment(request: &TreatmentRequest) -> Self {
        Self::new(
            MessageType::StartTreatment,
            &[request.temperature(), request.time()],
        )
    }

    /// Frame asking the device for its status
    pub fn status_query() -> Self {
        Self::new(MessageType::Status, &[STATUS_CHECKSUM_PLACEHOLDER])
    }

    pub fn as_bytes(&self) -> &[u8; FRAME_SIZE] {
        &self.0
    }

    pub fn message_type(&self) -> u8 {
        self.0[1]
    }
}

impl AsRef<[u8]> for CommandFrame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Decoded status response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusFrame {
    /// Header byte as received
    pub header: u8,
    /// Message type byte as received
    pub msg_type: u8,
    /// Current temperature reading
    pub temperature: u16,
    /// Internal sensor reading
    pub internal: u8,
    /// External sensor reading
    pub external: u8,
    /// Regulation loop value reported by the device
    pub pid: u16,
    /// Checksum byte as received
    pub checksum: u8,
}

impl StatusFrame {
    /// Interpret the message type byte
    pub fn message_type(&self) -> Result<MessageType> {
        MessageType::try_from(self.msg_type)
    }
}

/// Encode a start-treatment command
///
/// Fails with [`ProtocolError::InvalidArgument`] if `temperature > 3` or
/// `time > 2`.
///
/// # Example
/// ```
/// use protocol::encode_start_treatment;
///
/// let frame = encode_start_treatment(1, 1).unwrap();
/// assert_eq!(frame.as_bytes(), &[0xFF, 0x08, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0]);
/// assert!(encode_start_treatment(4, 1).is_err());
/// ```
pub fn encode_start_treatment(temperature: u8, time: u8) -> Result<CommandFrame> {
    let request = TreatmentRequest::new(temperature, time)?;
    Ok(CommandFrame::start_treatment(&request))
}

/// Encode the fixed status query
pub fn encode_status_query() -> CommandFrame {
    CommandFrame::status_query()
}

/// Decode a status response
///
/// Only the first [`FRAME_SIZE`] bytes are examined; fewer than that fails
/// with [`ProtocolError::ShortFrame`].
pub fn decode_status(bytes: &[u8]) -> Result<StatusFrame> {
    let mut buf = bytes.get(..FRAME_SIZE).ok_or(ProtocolError::ShortFrame {
        expected: FRAME_SIZE,
        actual: bytes.len(),
    })?;

    Ok(StatusFrame {
        header: buf.get_u8(),
        msg_type: buf.get_u8(),
        temperature: buf.get_u16(),
        internal: buf.get_u8(),
        external: buf.get_u8(),
        pid: buf.get_u16(),
        checksum: buf.get_u8(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_query_bytes() {
        let frame = encode_status_query();
        assert_eq!(
            frame.as_bytes(),
            &[0xFF, 0x02, 0x01, 0, 0, 0, 0, 0, 0, 0, 0, 0]
        );
        assert_eq!(frame.message_type(), 0x02);
    }

    #[test]
    fn test_start_treatment_bytes() {
        let frame = encode_start_treatment(2, 1).unwrap();
        assert_eq!(
            frame.as_bytes(),
            &[0xFF, 0x08, 2, 1, 0, 0, 0, 0, 0, 0, 0, 0]
        );
        assert_eq!(frame.as_ref().len(), FRAME_SIZE);
    }

    #[test]
    fn test_start_treatment_rejects_out_of_range() {
        assert_eq!(
            encode_start_treatment(4, 0),
            Err(ProtocolError::InvalidArgument {
                field: "temperature",
                value: 4,
                max: 3
            })
        );
        assert_eq!(
            encode_start_treatment(0, 3),
            Err(ProtocolError::InvalidArgument {
                field: "time",
                value: 3,
                max: 2
            })
        );
    }

    #[test]
    fn test_decode_status_big_endian() {
        let bytes = [
            0xFF, 0x02, 0x00, 0x96, 0x1E, 0x1F, 0x01, 0x2C, 0x00, 0x00, 0x00, 0x00,
        ];
        let status = decode_status(&bytes).unwrap();
        assert_eq!(status.header, 0xFF);
        assert_eq!(status.msg_type, 0x02);
        assert_eq!(status.temperature, 150);
        assert_eq!(status.internal, 0x1E);
        assert_eq!(status.external, 0x1F);
        assert_eq!(status.pid, 300);
        assert_eq!(status.checksum, 0x00);
    }

    #[test]
    fn test_decode_status_short_frame() {
        let bytes = [0xFF, 0x02, 0x00];
        assert_eq!(
            decode_status(&bytes),
            Err(ProtocolError::ShortFrame {
                expected: 12,
                actual: 3
            })
        );
        assert!(decode_status(&[]).is_err());
    }

    #[test]
    fn test_status_message_type() {
        let mut bytes = [0u8; FRAME_SIZE];
        bytes[0] = FRAME_HEADER;
        bytes[1] = 0x02;
        let status = decode_status(&bytes).unwrap();
        assert_eq!(status.message_type(), Ok(MessageType::Status));

        bytes[1] = 0x05;
        let status = decode_status(&bytes).unwrap();
        assert_eq!(status.msg_type, 0x05);
        assert_eq!(
            status.message_type(),
            Err(ProtocolError::UnknownMessageType(0x05))
        );
    }

    #[test]
    fn test_decode_status_ignores_checksum() {
        let mut bytes = [0u8; FRAME_SIZE];
        bytes[0] = 0xFF;
        bytes[1] = 0x02;
        bytes[8] = 0xAB;
        let status = decode_status(&bytes).unwrap();
        assert_eq!(status.checksum, 0xAB);
    }
}
