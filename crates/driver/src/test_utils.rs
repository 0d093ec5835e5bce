//! Test utilities for the driver
//!
//! [`MockBackend`] is an in-memory stand-in for a libusb context. It serves
//! one scripted [`MockDevice`] and records every call made through its
//! handles, including how many handles are open and which interfaces are
//! claimed, so tests can check that sessions never leak resources.
//!
//! # Example
//!
//! ```
//! use driver::test_utils::{MockBackend, MockDevice};
//! use driver::{DeviceSession, request_status};
//! use protocol::{HEAT_DEVICE, HEAT_ENDPOINTS};
//!
//! let backend = MockBackend::with_device(MockDevice::heat_device());
//! let session = DeviceSession::open_with(backend.clone(), HEAT_DEVICE, HEAT_ENDPOINTS).unwrap();
//! let status = request_status(&session).unwrap();
//! assert_eq!(status.temperature, 150);
//! drop(session);
//! assert_eq!(backend.stats().open_handles, 0);
//! ```

use crate::usb::{DeviceIo, UsbBackend};
use protocol::{DeviceIdentity, HEAT_DEVICE};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;
use std::time::Duration;

/// Status response used by [`MockDevice::heat_device`]
///
/// Decodes to temperature 150, internal 0x1E, external 0x1F, PID 300.
pub const SAMPLE_STATUS_RESPONSE: [u8; 12] = [
    0xFF, 0x02, 0x00, 0x96, 0x1E, 0x1F, 0x01, 0x2C, 0x00, 0x00, 0x00, 0x00,
];

/// Scripted behavior of a simulated device
#[derive(Debug, Clone)]
pub struct MockDevice {
    pub identity: DeviceIdentity,
    /// Error returned when opening the device
    pub open_error: Option<rusb::Error>,
    /// Active configuration value
    pub configuration: u8,
    /// Interfaces with a kernel driver bound
    pub kernel_drivers: BTreeSet<u8>,
    /// Error returned when querying kernel driver status
    pub kernel_driver_query_error: Option<rusb::Error>,
    /// Error returned when detaching a kernel driver
    pub detach_error: Option<rusb::Error>,
    /// Error returned when reading the active configuration
    pub get_configuration_error: Option<rusb::Error>,
    /// Error returned when setting the active configuration
    pub set_configuration_error: Option<rusb::Error>,
    /// Interfaces that refuse to be claimed
    pub unclaimable: BTreeSet<u8>,
    /// Error returned by bulk OUT transfers
    pub write_error: Option<rusb::Error>,
    /// Byte count reported by bulk OUT transfers, capped at the frame length
    pub write_len: Option<usize>,
    /// Error returned by bulk IN transfers
    pub read_error: Option<rusb::Error>,
    /// Bytes returned by bulk IN transfers
    pub response: Vec<u8>,
}

impl MockDevice {
    /// A healthy device in configuration 1 with a kernel driver on interface 0
    pub fn heat_device() -> Self {
        Self {
            identity: HEAT_DEVICE,
            open_error: None,
            configuration: 1,
            kernel_drivers: BTreeSet::from([0]),
            kernel_driver_query_error: None,
            detach_error: None,
            get_configuration_error: None,
            set_configuration_error: None,
            unclaimable: BTreeSet::new(),
            write_error: None,
            write_len: None,
            read_error: None,
            response: SAMPLE_STATUS_RESPONSE.to_vec(),
        }
    }
}

/// Recorded bulk transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRecord {
    pub endpoint: u8,
    /// Bytes written, or the buffer length offered for a read
    pub data: Vec<u8>,
    pub timeout: Duration,
}

/// Calls observed by a [`MockBackend`]
#[derive(Debug, Clone, Default)]
pub struct MockStats {
    /// Handles currently open
    pub open_handles: usize,
    /// Total successful opens
    pub opens: usize,
    /// Interfaces currently claimed
    pub claimed: BTreeSet<u8>,
    /// Interfaces whose kernel driver was detached
    pub detached: Vec<u8>,
    /// Configuration values set, in order
    pub configurations_set: Vec<u8>,
    /// Interface release calls, in order
    pub releases: Vec<u8>,
    pub writes: Vec<TransferRecord>,
    pub reads: Vec<TransferRecord>,
}

impl MockStats {
    /// Number of bulk transfers attempted in either direction
    pub fn transfer_count(&self) -> usize {
        self.writes.len() + self.reads.len()
    }
}

#[derive(Debug)]
struct Shared {
    device: Option<MockDevice>,
    stats: MockStats,
}

/// In-memory USB context
///
/// Clones share the same device and statistics, so a test can keep one
/// clone while a session owns the other.
#[derive(Debug, Clone)]
pub struct MockBackend {
    shared: Rc<RefCell<Shared>>,
}

impl MockBackend {
    /// Backend with no attached device
    pub fn empty() -> Self {
        Self {
            shared: Rc::new(RefCell::new(Shared {
                device: None,
                stats: MockStats::default(),
            })),
        }
    }

    /// Backend with `device` attached
    pub fn with_device(device: MockDevice) -> Self {
        let backend = Self::empty();
        backend.shared.borrow_mut().device = Some(device);
        backend
    }

    /// Snapshot of the recorded calls
    pub fn stats(&self) -> MockStats {
        self.shared.borrow().stats.clone()
    }

    /// Change the attached device's behavior
    pub fn update_device(&self, update: impl FnOnce(&mut MockDevice)) {
        if let Some(device) = self.shared.borrow_mut().device.as_mut() {
            update(device);
        }
    }
}

impl UsbBackend for MockBackend {
    type Handle = MockHandle;

    fn open_device(&self, identity: DeviceIdentity) -> rusb::Result<Option<MockHandle>> {
        let mut shared = self.shared.borrow_mut();
        let open_error = match &shared.device {
            Some(device) if device.identity == identity => device.open_error,
            _ => return Ok(None),
        };
        if let Some(e) = open_error {
            return Err(e);
        }

        shared.stats.open_handles += 1;
        shared.stats.opens += 1;
        Ok(Some(MockHandle {
            shared: Rc::clone(&self.shared),
        }))
    }
}

/// Open handle on a [`MockBackend`] device
#[derive(Debug)]
pub struct MockHandle {
    shared: Rc<RefCell<Shared>>,
}

impl MockHandle {
    fn with_device<T>(
        &self,
        f: impl FnOnce(&mut MockDevice, &mut MockStats) -> rusb::Result<T>,
    ) -> rusb::Result<T> {
        let mut shared = self.shared.borrow_mut();
        let Shared { device, stats } = &mut *shared;
        match device.as_mut() {
            Some(device) => f(device, stats),
            None => Err(rusb::Error::NoDevice),
        }
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        let mut shared = self.shared.borrow_mut();
        shared.stats.open_handles = shared.stats.open_handles.saturating_sub(1);
    }
}

impl DeviceIo for MockHandle {
    fn kernel_driver_active(&self, interface: u8) -> rusb::Result<bool> {
        self.with_device(|device, _| match device.kernel_driver_query_error {
            Some(e) => Err(e),
            None => Ok(device.kernel_drivers.contains(&interface)),
        })
    }

    fn detach_kernel_driver(&mut self, interface: u8) -> rusb::Result<()> {
        self.with_device(|device, stats| {
            if let Some(e) = device.detach_error {
                return Err(e);
            }
            if !device.kernel_drivers.remove(&interface) {
                return Err(rusb::Error::NotFound);
            }
            stats.detached.push(interface);
            Ok(())
        })
    }

    fn active_configuration(&self) -> rusb::Result<u8> {
        self.with_device(|device, _| match device.get_configuration_error {
            Some(e) => Err(e),
            None => Ok(device.configuration),
        })
    }

    fn set_active_configuration(&mut self, config: u8) -> rusb::Result<()> {
        self.with_device(|device, stats| {
            if let Some(e) = device.set_configuration_error {
                return Err(e);
            }
            device.configuration = config;
            stats.configurations_set.push(config);
            Ok(())
        })
    }

    fn claim_interface(&mut self, interface: u8) -> rusb::Result<()> {
        self.with_device(|device, stats| {
            if device.unclaimable.contains(&interface) {
                return Err(rusb::Error::Busy);
            }
            stats.claimed.insert(interface);
            Ok(())
        })
    }

    fn release_interface(&mut self, interface: u8) -> rusb::Result<()> {
        self.with_device(|_, stats| {
            stats.releases.push(interface);
            if stats.claimed.remove(&interface) {
                Ok(())
            } else {
                Err(rusb::Error::NotFound)
            }
        })
    }

    fn write_bulk(&self, endpoint: u8, buf: &[u8], timeout: Duration) -> rusb::Result<usize> {
        self.with_device(|device, stats| {
            stats.writes.push(TransferRecord {
                endpoint,
                data: buf.to_vec(),
                timeout,
            });
            match device.write_error {
                Some(e) => Err(e),
                None => Ok(device.write_len.map_or(buf.len(), |len| len.min(buf.len()))),
            }
        })
    }

    fn read_bulk(&self, endpoint: u8, buf: &mut [u8], timeout: Duration) -> rusb::Result<usize> {
        self.with_device(|device, stats| {
            stats.reads.push(TransferRecord {
                endpoint,
                data: vec![0; buf.len()],
                timeout,
            });
            if let Some(e) = device.read_error {
                return Err(e);
            }
            let len = device.response.len().min(buf.len());
            buf[..len].copy_from_slice(&device.response[..len]);
            Ok(len)
        })
    }
}
