//! Request/response exchanges with the device
//!
//! Both operations borrow an open session and leave it open whatever the
//! outcome; closing is up to the owner of the session.

use crate::error::Result;
use crate::usb::{DeviceSession, UsbBackend, bulk_read, bulk_write};
use protocol::{
    MessageType, StatusFrame, decode_status, encode_start_treatment, encode_status_query,
};
use tracing::{debug, info, warn};

/// Successful start-treatment command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    pub bytes_written: usize,
}

/// Query the device status
///
/// Sends the status query, reads one frame back and decodes it. A failed
/// write returns before any read is attempted.
pub fn request_status<B: UsbBackend>(session: &DeviceSession<B>) -> Result<StatusFrame> {
    let query = encode_status_query();
    bulk_write(session, query.as_ref())?;

    let response = bulk_read(session, session.endpoints().frame_size)?;
    debug!(
        "Status response ({} bytes): {}",
        response.len(),
        hex::encode(&response)
    );

    let status = decode_status(&response)?;
    if status.message_type() != Ok(MessageType::Status) {
        warn!("Unexpected message type in status response: {:#04x}", status.msg_type);
    }
    Ok(status)
}

/// Start a treatment at the given temperature and time levels
///
/// The levels are validated before anything is sent. The device does not
/// acknowledge this command, so nothing is read back.
pub fn start_treatment<B: UsbBackend>(
    session: &DeviceSession<B>,
    temperature: u8,
    time: u8,
) -> Result<Ack> {
    let frame = encode_start_treatment(temperature, time)?;
    let bytes_written = bulk_write(session, frame.as_ref())?;

    info!(
        "Started treatment: temperature level {}, time level {}",
        temperature, time
    );
    Ok(Ack { bytes_written })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DriverError;
    use crate::test_utils::{MockBackend, MockDevice};
    use protocol::{HEAT_DEVICE, HEAT_ENDPOINTS, ProtocolError};

    fn open(backend: &MockBackend) -> DeviceSession<MockBackend> {
        DeviceSession::open_with(backend.clone(), HEAT_DEVICE, HEAT_ENDPOINTS).unwrap()
    }

    #[test]
    fn test_request_status_sends_query() {
        let backend = MockBackend::with_device(MockDevice::heat_device());
        let session = open(&backend);

        request_status(&session).unwrap();

        let stats = backend.stats();
        assert_eq!(
            stats.writes[0].data,
            vec![0xFF, 0x02, 0x01, 0, 0, 0, 0, 0, 0, 0, 0, 0]
        );
        assert_eq!(stats.reads[0].data.len(), 12);
    }

    #[test]
    fn test_request_status_short_response() {
        let mut device = MockDevice::heat_device();
        device.response = vec![0xFF, 0x02, 0x00, 0x96];
        let backend = MockBackend::with_device(device);
        let session = open(&backend);

        let err = request_status(&session).unwrap_err();
        assert!(matches!(
            err,
            DriverError::Frame(ProtocolError::ShortFrame {
                expected: 12,
                actual: 4
            })
        ));
    }

    #[test]
    fn test_request_status_unexpected_type_still_decodes() {
        let mut device = MockDevice::heat_device();
        device.response[1] = 0x08;
        let backend = MockBackend::with_device(device);
        let session = open(&backend);

        let status = request_status(&session).unwrap();
        assert_eq!(status.msg_type, 0x08);
        assert_eq!(status.temperature, 150);
    }

    #[test]
    fn test_start_treatment_reads_nothing() {
        let backend = MockBackend::with_device(MockDevice::heat_device());
        let session = open(&backend);

        let ack = start_treatment(&session, 1, 1).unwrap();
        assert_eq!(ack, Ack { bytes_written: 12 });
        assert!(backend.stats().reads.is_empty());
    }

    #[test]
    fn test_short_write_is_reported_not_failed() {
        let mut device = MockDevice::heat_device();
        device.write_len = Some(7);
        let backend = MockBackend::with_device(device);
        let session = open(&backend);

        let ack = start_treatment(&session, 1, 1).unwrap();
        assert_eq!(ack, Ack { bytes_written: 7 });
        assert_eq!(backend.stats().writes[0].data.len(), 12);
    }
}
