//! USB bulk transfer execution
//!
//! Each call performs exactly one blocking transfer on the session's fixed
//! endpoints with the session's timeouts. Nothing is retried.

use crate::error::{Direction, DriverError, Result};
use crate::usb::{DeviceIo, DeviceSession, UsbBackend};
use tracing::{debug, warn};

/// Write `frame` to the bulk OUT endpoint
///
/// Returns the number of bytes the device accepted.
pub fn bulk_write<B: UsbBackend>(session: &DeviceSession<B>, frame: &[u8]) -> Result<usize> {
    let handle = session.transfer_handle()?;
    let endpoints = session.endpoints();

    debug!(
        "Bulk OUT: endpoint={:#x}, data_len={}, timeout={}ms",
        endpoints.bulk_out,
        frame.len(),
        endpoints.write_timeout.as_millis()
    );

    match handle.write_bulk(endpoints.bulk_out, frame, endpoints.write_timeout) {
        Ok(written) => {
            if written != frame.len() {
                warn!(
                    "Short bulk write on endpoint {:#x}: {} of {} bytes",
                    endpoints.bulk_out,
                    written,
                    frame.len()
                );
            }
            debug!("Wrote {} bytes to the device", written);
            Ok(written)
        }
        Err(e) => Err(transfer_error(Direction::Write, endpoints.bulk_out, e)),
    }
}

/// Read up to `max_len` bytes from the bulk IN endpoint
///
/// The returned buffer is truncated to the bytes actually read.
pub fn bulk_read<B: UsbBackend>(session: &DeviceSession<B>, max_len: usize) -> Result<Vec<u8>> {
    let handle = session.transfer_handle()?;
    let endpoints = session.endpoints();

    debug!(
        "Bulk IN: endpoint={:#x}, max_len={}, timeout={}ms",
        endpoints.bulk_in,
        max_len,
        endpoints.read_timeout.as_millis()
    );

    let mut buffer = vec![0u8; max_len];
    match handle.read_bulk(endpoints.bulk_in, &mut buffer, endpoints.read_timeout) {
        Ok(len) => {
            buffer.truncate(len);
            debug!("Read {} bytes from the device", len);
            Ok(buffer)
        }
        Err(e) => Err(transfer_error(Direction::Read, endpoints.bulk_in, e)),
    }
}

fn transfer_error(direction: Direction, endpoint: u8, source: rusb::Error) -> DriverError {
    if matches!(source, rusb::Error::Timeout) {
        warn!("Bulk {} on endpoint {:#x} timed out", direction, endpoint);
    } else {
        warn!(
            "Bulk {} on endpoint {:#x} failed: {} ({})",
            direction,
            endpoint,
            source,
            libusb_code(&source)
        );
    }
    DriverError::Transport { direction, source }
}

/// Map rusb::Error back to the libusb status code
///
/// Used for diagnostics; libusb reports failures as negative integers.
pub fn libusb_code(err: &rusb::Error) -> i32 {
    match err {
        rusb::Error::Io => -1,
        rusb::Error::InvalidParam => -2,
        rusb::Error::Access => -3,
        rusb::Error::NoDevice => -4,
        rusb::Error::NotFound => -5,
        rusb::Error::Busy => -6,
        rusb::Error::Timeout => -7,
        rusb::Error::Overflow => -8,
        rusb::Error::Pipe => -9,
        rusb::Error::Interrupted => -10,
        rusb::Error::NoMem => -11,
        rusb::Error::NotSupported => -12,
        _ => -99,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockBackend, MockDevice};
    use protocol::{HEAT_DEVICE, HEAT_ENDPOINTS};
    use std::time::Duration;

    #[test]
    fn test_libusb_code() {
        assert_eq!(libusb_code(&rusb::Error::Timeout), -7);
        assert_eq!(libusb_code(&rusb::Error::Pipe), -9);
        assert_eq!(libusb_code(&rusb::Error::NoDevice), -4);
        assert_eq!(libusb_code(&rusb::Error::Other), -99);
    }

    #[test]
    fn test_bulk_write_uses_out_endpoint_and_timeout() {
        let backend = MockBackend::with_device(MockDevice::heat_device());
        let session =
            DeviceSession::open_with(backend.clone(), HEAT_DEVICE, HEAT_ENDPOINTS).unwrap();

        let written = bulk_write(&session, &[0xFF; 12]).unwrap();
        assert_eq!(written, 12);

        let stats = backend.stats();
        assert_eq!(stats.writes.len(), 1);
        assert_eq!(stats.writes[0].endpoint, 0x02);
        assert_eq!(stats.writes[0].timeout, Duration::from_millis(1000));
    }

    #[test]
    fn test_bulk_read_truncates_to_received() {
        let mut device = MockDevice::heat_device();
        device.response = vec![0xFF, 0x02, 0x03];
        let backend = MockBackend::with_device(device);
        let session =
            DeviceSession::open_with(backend.clone(), HEAT_DEVICE, HEAT_ENDPOINTS).unwrap();

        let bytes = bulk_read(&session, 12).unwrap();
        assert_eq!(bytes, vec![0xFF, 0x02, 0x03]);

        let stats = backend.stats();
        assert_eq!(stats.reads.len(), 1);
        assert_eq!(stats.reads[0].endpoint, 0x82);
        assert_eq!(stats.reads[0].timeout, Duration::from_millis(1500));
    }

    #[test]
    fn test_bulk_read_timeout_is_transport_error() {
        let mut device = MockDevice::heat_device();
        device.read_error = Some(rusb::Error::Timeout);
        let backend = MockBackend::with_device(device);
        let session = DeviceSession::open_with(backend, HEAT_DEVICE, HEAT_ENDPOINTS).unwrap();

        let err = bulk_read(&session, 12).unwrap_err();
        assert!(err.is_timeout());
        assert!(matches!(
            err,
            DriverError::Transport {
                direction: Direction::Read,
                ..
            }
        ));
    }
}
