//! USB subsystem
//!
//! Locates the device, owns its session, and executes bulk transfers.
//!
//! The session and transfer code is written against two small traits so it
//! can run on libusb through `rusb` or on the in-memory backend in
//! [`crate::test_utils`]:
//! - [`UsbBackend`]: a library context able to open a device by VID/PID
//! - [`DeviceIo`]: the per-handle calls a session needs

pub mod session;
pub mod transfers;

pub use session::{DeviceSession, SessionState, open_device};
pub use transfers::{bulk_read, bulk_write, libusb_code};

use crate::error::{DriverError, Result};
use protocol::DeviceIdentity;
use rusb::{Context, DeviceHandle, UsbContext};
use std::time::Duration;
use tracing::debug;

/// A USB library context
pub trait UsbBackend {
    type Handle: DeviceIo;

    /// Open the first device matching `identity`
    ///
    /// Returns `Ok(None)` when no such device is attached.
    fn open_device(&self, identity: DeviceIdentity) -> rusb::Result<Option<Self::Handle>>;
}

/// Operations on an open device handle
pub trait DeviceIo {
    fn kernel_driver_active(&self, interface: u8) -> rusb::Result<bool>;
    fn detach_kernel_driver(&mut self, interface: u8) -> rusb::Result<()>;
    fn active_configuration(&self) -> rusb::Result<u8>;
    fn set_active_configuration(&mut self, config: u8) -> rusb::Result<()>;
    fn claim_interface(&mut self, interface: u8) -> rusb::Result<()>;
    fn release_interface(&mut self, interface: u8) -> rusb::Result<()>;
    fn write_bulk(&self, endpoint: u8, buf: &[u8], timeout: Duration) -> rusb::Result<usize>;
    fn read_bulk(&self, endpoint: u8, buf: &mut [u8], timeout: Duration) -> rusb::Result<usize>;
}

impl UsbBackend for Context {
    type Handle = DeviceHandle<Context>;

    fn open_device(&self, identity: DeviceIdentity) -> rusb::Result<Option<Self::Handle>> {
        for device in self.devices()?.iter() {
            let descriptor = match device.device_descriptor() {
                Ok(descriptor) => descriptor,
                Err(e) => {
                    debug!(
                        "Skipping device bus={} addr={}: {}",
                        device.bus_number(),
                        device.address(),
                        e
                    );
                    continue;
                }
            };

            if descriptor.vendor_id() == identity.vendor_id
                && descriptor.product_id() == identity.product_id
            {
                debug!(
                    "Found {} at bus={} addr={}",
                    identity,
                    device.bus_number(),
                    device.address()
                );
                return device.open().map(Some);
            }
        }

        Ok(None)
    }
}

impl DeviceIo for DeviceHandle<Context> {
    fn kernel_driver_active(&self, interface: u8) -> rusb::Result<bool> {
        DeviceHandle::kernel_driver_active(self, interface)
    }

    fn detach_kernel_driver(&mut self, interface: u8) -> rusb::Result<()> {
        DeviceHandle::detach_kernel_driver(self, interface)
    }

    fn active_configuration(&self) -> rusb::Result<u8> {
        DeviceHandle::active_configuration(self)
    }

    fn set_active_configuration(&mut self, config: u8) -> rusb::Result<()> {
        DeviceHandle::set_active_configuration(self, config)
    }

    fn claim_interface(&mut self, interface: u8) -> rusb::Result<()> {
        DeviceHandle::claim_interface(self, interface)
    }

    fn release_interface(&mut self, interface: u8) -> rusb::Result<()> {
        DeviceHandle::release_interface(self, interface)
    }

    fn write_bulk(&self, endpoint: u8, buf: &[u8], timeout: Duration) -> rusb::Result<usize> {
        DeviceHandle::write_bulk(self, endpoint, buf, timeout)
    }

    fn read_bulk(&self, endpoint: u8, buf: &mut [u8], timeout: Duration) -> rusb::Result<usize> {
        DeviceHandle::read_bulk(self, endpoint, buf, timeout)
    }
}

/// Create a libusb context
///
/// With `libusb_debug` set, libusb's own debug output is enabled.
pub fn create_context(libusb_debug: bool) -> Result<Context> {
    let mut context = Context::new().map_err(DriverError::Context)?;

    if libusb_debug {
        context.set_log_level(rusb::LogLevel::Debug);
        debug!("libusb debug output enabled");
    }

    Ok(context)
}
