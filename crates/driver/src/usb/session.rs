//! Device session lifecycle
//!
//! A [`DeviceSession`] owns the USB context and the open device handle. It
//! moves through `Unopened -> Opening -> Claimed -> Closed`; bulk transfers
//! are only permitted while `Claimed`.
//!
//! Opening follows a permissive policy: kernel driver detachment and
//! interface claims that fail are logged and skipped, while a missing device
//! or a rejected configuration aborts the open. Whatever was acquired is
//! released by [`DeviceSession::close`], which also runs on drop.

use crate::error::{DriverError, Result};
use crate::usb::{DeviceIo, UsbBackend, create_context};
use protocol::{CLAIMED_INTERFACES, DeviceIdentity, EndpointConfig, REQUIRED_CONFIGURATION};
use rusb::Context;
use std::fmt;
use tracing::{debug, info, warn};

/// Lifecycle state of a [`DeviceSession`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Unopened,
    Opening,
    Claimed,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Unopened => "unopened",
            SessionState::Opening => "opening",
            SessionState::Claimed => "claimed",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Open, interface-claimed handle to one device
pub struct DeviceSession<B: UsbBackend> {
    /// Library context, dropped on close
    backend: Option<B>,
    /// Device handle (if opened)
    handle: Option<B::Handle>,
    /// Endpoint addresses and timeouts for transfers
    endpoints: EndpointConfig,
    /// List of interfaces claimed by us
    claimed_interfaces: Vec<u8>,
    state: SessionState,
}

impl<B: UsbBackend> DeviceSession<B> {
    /// Create an unopened session owning `backend`
    pub fn new(backend: B, endpoints: EndpointConfig) -> Self {
        Self {
            backend: Some(backend),
            handle: None,
            endpoints,
            claimed_interfaces: Vec::new(),
            state: SessionState::Unopened,
        }
    }

    /// Create a session on `backend` and open `identity` with it
    pub fn open_with(
        backend: B,
        identity: DeviceIdentity,
        endpoints: EndpointConfig,
    ) -> Result<Self> {
        let mut session = Self::new(backend, endpoints);
        session.open(identity)?;
        Ok(session)
    }

    /// Open the device and claim its interfaces
    ///
    /// Only valid on an unopened session. On failure the session ends up
    /// `Closed` holding no handle, claim or context.
    pub fn open(&mut self, identity: DeviceIdentity) -> Result<()> {
        if self.state != SessionState::Unopened {
            return Err(DriverError::InvalidState { state: self.state });
        }
        self.state = SessionState::Opening;

        let acquired = match self.backend.as_ref() {
            Some(backend) => acquire(backend, identity),
            None => Err(DriverError::InvalidState { state: self.state }),
        };

        match acquired {
            Ok((handle, claimed)) => {
                info!(
                    "Opened device {} with interfaces {:?} claimed",
                    identity, claimed
                );
                self.handle = Some(handle);
                self.claimed_interfaces = claimed;
                self.state = SessionState::Claimed;
                Ok(())
            }
            Err(e) => {
                warn!("Failed to open device {}: {}", identity, e);
                self.backend = None;
                self.state = SessionState::Closed;
                Err(e)
            }
        }
    }

    /// Close the session
    ///
    /// Releases the claimed interfaces, closes the handle and drops the
    /// context. Calling it again is a no-op.
    pub fn close(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            for interface in self.claimed_interfaces.drain(..) {
                if let Err(e) = handle.release_interface(interface) {
                    warn!("Failed to release interface {}: {}", interface, e);
                } else {
                    debug!("Released interface {}", interface);
                }
            }
            drop(handle);
            debug!("Closed device handle");
        }

        if self.backend.take().is_some() {
            debug!("Released USB context");
        }

        self.state = SessionState::Closed;
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Check if transfers are currently permitted
    pub fn is_claimed(&self) -> bool {
        self.state == SessionState::Claimed
    }

    /// Interfaces successfully claimed during open
    pub fn claimed_interfaces(&self) -> &[u8] {
        &self.claimed_interfaces
    }

    pub fn endpoints(&self) -> &EndpointConfig {
        &self.endpoints
    }

    /// Handle for a transfer, or `InvalidState` outside `Claimed`
    pub(crate) fn transfer_handle(&self) -> Result<&B::Handle> {
        match (self.state, self.handle.as_ref()) {
            (SessionState::Claimed, Some(handle)) => Ok(handle),
            (state, _) => Err(DriverError::InvalidState { state }),
        }
    }
}

impl<B: UsbBackend> Drop for DeviceSession<B> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Open the device on a fresh libusb context
pub fn open_device(
    identity: DeviceIdentity,
    endpoints: EndpointConfig,
    libusb_debug: bool,
) -> Result<DeviceSession<Context>> {
    let context = create_context(libusb_debug)?;
    DeviceSession::open_with(context, identity, endpoints)
}

/// Open the device, prepare it, and claim what can be claimed
fn acquire<B: UsbBackend>(backend: &B, identity: DeviceIdentity) -> Result<(B::Handle, Vec<u8>)> {
    let mut handle = match backend.open_device(identity) {
        Ok(Some(handle)) => handle,
        Ok(None) | Err(rusb::Error::NotFound) | Err(rusb::Error::NoDevice) => {
            return Err(DriverError::DeviceNotFound { identity });
        }
        Err(source) => return Err(DriverError::Open { identity, source }),
    };
    debug!("Opened handle for {}", identity);

    for interface in CLAIMED_INTERFACES {
        if let Err(e) = detach_kernel_driver(&mut handle, interface) {
            warn!(
                "Failed to detach kernel driver from interface {}: {}",
                interface, e
            );
        }
    }

    select_configuration(&mut handle, REQUIRED_CONFIGURATION)?;

    let mut claimed = Vec::with_capacity(CLAIMED_INTERFACES.len());
    for interface in CLAIMED_INTERFACES {
        match handle.claim_interface(interface) {
            Ok(()) => {
                debug!("Claimed interface {}", interface);
                claimed.push(interface);
            }
            Err(e) => warn!("Failed to claim interface {}: {}", interface, e),
        }
    }

    Ok((handle, claimed))
}

/// Detach the kernel driver from `interface` if one is bound
fn detach_kernel_driver<H: DeviceIo>(handle: &mut H, interface: u8) -> rusb::Result<()> {
    match handle.kernel_driver_active(interface) {
        Ok(true) => {
            debug!("Detaching kernel driver from interface {}", interface);
            handle.detach_kernel_driver(interface)
        }
        Ok(false) => {
            debug!("No kernel driver active on interface {}", interface);
            Ok(())
        }
        Err(e) => {
            // Not supported on every platform; claiming decides later.
            debug!(
                "Could not check kernel driver status for interface {}: {}",
                interface, e
            );
            Ok(())
        }
    }
}

/// Make `value` the active configuration
fn select_configuration<H: DeviceIo>(handle: &mut H, value: u8) -> Result<()> {
    let current = handle
        .active_configuration()
        .map_err(|source| DriverError::Configuration { value, source })?;
    debug!("Active configuration: {}", current);

    if current != value {
        handle
            .set_active_configuration(value)
            .map_err(|source| DriverError::Configuration { value, source })?;
        info!("Selected configuration {}", value);
    }

    Ok(())
}
