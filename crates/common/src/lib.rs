//! Common utilities for rust-heat-usb
//!
//! Shared ambient pieces used by the binaries: logging setup and the error
//! type it reports.

pub mod error;
pub mod logging;

pub use error::{Error, Result};
pub use logging::{LOG_LEVELS, is_valid_level, setup_logging};
