//! Host-side driver for the heat treatment device
//!
//! Opens a session against the device over libusb, claims its interfaces,
//! and runs the two supported exchanges on its bulk endpoints:
//!
//! - [`request_status`]: send a status query and decode the 12-byte reply
//! - [`start_treatment`]: send a validated start-treatment command
//!
//! Everything here is blocking and single-threaded. A [`DeviceSession`]
//! releases its interfaces, handle and context when closed or dropped.
//!
//! # Example
//!
//! ```no_run
//! use driver::{open_device, request_status};
//! use protocol::{HEAT_DEVICE, HEAT_ENDPOINTS};
//!
//! # fn main() -> driver::Result<()> {
//! let session = open_device(HEAT_DEVICE, HEAT_ENDPOINTS, false)?;
//! let status = request_status(&session)?;
//! println!("temperature: {}", status.temperature);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod operations;
pub mod test_utils;
pub mod usb;

pub use rusb;

pub use error::{Direction, DriverError, Result};
pub use operations::{Ack, request_status, start_treatment};
pub use usb::{
    DeviceIo, DeviceSession, SessionState, UsbBackend, bulk_read, bulk_write, create_context,
    libusb_code, open_device,
};
