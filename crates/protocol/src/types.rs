//! Device and request type definitions
//!
//! Compile-time identity of the treatment device, its endpoint layout, and
//! the validated parameters of a treatment request.

use crate::error::{ProtocolError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Highest accepted temperature level
pub const MAX_TEMPERATURE_LEVEL: u8 = 3;

/// Highest accepted time level
pub const MAX_TIME_LEVEL: u8 = 2;

/// Configuration value the device must be running for bulk transfers
pub const REQUIRED_CONFIGURATION: u8 = 2;

/// Interfaces claimed for the bulk endpoints, in claim order
pub const CLAIMED_INTERFACES: [u8; 2] = [0, 1];

/// USB vendor/product pair used to locate the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceIdentity {
    /// USB Vendor ID
    pub vendor_id: u16,
    /// USB Product ID
    pub product_id: u16,
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vendor_id, self.product_id)
    }
}

/// The heat treatment device
pub const HEAT_DEVICE: DeviceIdentity = DeviceIdentity {
    vendor_id: 0x32f9,
    product_id: 0x0001,
};

/// Bulk endpoint addresses and transfer limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointConfig {
    /// Device-to-host endpoint address
    pub bulk_in: u8,
    /// Host-to-device endpoint address
    pub bulk_out: u8,
    /// Size of every frame in bytes
    pub frame_size: usize,
    /// Timeout applied to each bulk OUT transfer
    pub write_timeout: Duration,
    /// Timeout applied to each bulk IN transfer
    pub read_timeout: Duration,
}

/// Endpoint layout of the heat treatment device
pub const HEAT_ENDPOINTS: EndpointConfig = EndpointConfig {
    bulk_in: 0x82,
    bulk_out: 0x02,
    frame_size: crate::codec::FRAME_SIZE,
    write_timeout: Duration::from_millis(1000),
    read_timeout: Duration::from_millis(1500),
};

impl Default for EndpointConfig {
    fn default() -> Self {
        HEAT_ENDPOINTS
    }
}

/// Message type byte at offset 1 of every frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    /// Status query (request) / status report (response)
    Status = 0x02,
    /// Start a timed treatment
    StartTreatment = 0x08,
}

impl From<MessageType> for u8 {
    fn from(msg: MessageType) -> u8 {
        msg as u8
    }
}

impl TryFrom<u8> for MessageType {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x02 => Ok(MessageType::Status),
            0x08 => Ok(MessageType::StartTreatment),
            other => Err(ProtocolError::UnknownMessageType(other)),
        }
    }
}

/// Range-checked treatment parameters
///
/// Can only be built through [`TreatmentRequest::new`], so a value of this
/// type always satisfies `temperature <= 3` and `time <= 2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TreatmentRequest {
    temperature: u8,
    time: u8,
}

impl TreatmentRequest {
    /// Validate a temperature level and a time level
    pub fn new(temperature: u8, time: u8) -> Result<Self> {
        if temperature > MAX_TEMPERATURE_LEVEL {
            return Err(ProtocolError::InvalidArgument {
                field: "temperature",
                value: temperature,
                max: MAX_TEMPERATURE_LEVEL,
            });
        }
        if time > MAX_TIME_LEVEL {
            return Err(ProtocolError::InvalidArgument {
                field: "time",
                value: time,
                max: MAX_TIME_LEVEL,
            });
        }

        Ok(Self { temperature, time })
    }

    pub fn temperature(&self) -> u8 {
        self.temperature
    }

    pub fn time(&self) -> u8 {
        self.time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heat_device_identity() {
        assert_eq!(HEAT_DEVICE.vendor_id, 0x32f9);
        assert_eq!(HEAT_DEVICE.product_id, 0x0001);
        assert_eq!(HEAT_DEVICE.to_string(), "32f9:0001");
    }

    #[test]
    fn test_heat_endpoints() {
        let ep = EndpointConfig::default();
        assert_eq!(ep.bulk_in, 0x82);
        assert_eq!(ep.bulk_out, 0x02);
        assert_eq!(ep.frame_size, 12);
        assert_eq!(ep.write_timeout, Duration::from_millis(1000));
        assert_eq!(ep.read_timeout, Duration::from_millis(1500));
        // Bit 7 marks the IN direction
        assert_ne!(ep.bulk_in & 0x80, 0);
        assert_eq!(ep.bulk_out & 0x80, 0);
    }

    #[test]
    fn test_message_type_conversion() {
        assert_eq!(u8::from(MessageType::Status), 0x02);
        assert_eq!(u8::from(MessageType::StartTreatment), 0x08);
        assert_eq!(MessageType::try_from(0x08), Ok(MessageType::StartTreatment));
        assert_eq!(
            MessageType::try_from(0x03),
            Err(ProtocolError::UnknownMessageType(0x03))
        );
    }

    #[test]
    fn test_treatment_request_bounds() {
        let req = TreatmentRequest::new(3, 2).unwrap();
        assert_eq!(req.temperature(), 3);
        assert_eq!(req.time(), 2);

        assert!(matches!(
            TreatmentRequest::new(4, 0),
            Err(ProtocolError::InvalidArgument {
                field: "temperature",
                ..
            })
        ));
        assert!(matches!(
            TreatmentRequest::new(0, 3),
            Err(ProtocolError::InvalidArgument { field: "time", .. })
        ));
    }
}
