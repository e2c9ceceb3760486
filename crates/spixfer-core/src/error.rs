//! Error types for spixfer-core
//!
//! Every failure is reported synchronously to the caller of the operation
//! that triggered it. None of them poison the session: validation errors
//! leave all state untouched, I/O errors leave the session either fully open
//! or fully closed.

use core::fmt;
use std::io;
use thiserror::Error;

/// Device setting queried right after a device is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSetting {
    /// SPI mode flags (`SPI_IOC_RD_MODE`)
    Mode,
    /// Bits per word (`SPI_IOC_RD_BITS_PER_WORD`)
    BitsPerWord,
    /// Maximum clock speed in Hz (`SPI_IOC_RD_MAX_SPEED_HZ`)
    MaxSpeedHz,
}

impl fmt::Display for ConfigSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mode => write!(f, "spi mode"),
            Self::BitsPerWord => write!(f, "bits per word"),
            Self::MaxSpeedHz => write!(f, "max speed hz"),
        }
    }
}

/// Errors returned by sessions and the transfer engine
#[derive(Debug, Error)]
pub enum SpiError {
    /// Formatted device path does not fit the path bound
    #[error("Bus and/or device number is invalid: {path} is longer than {max} characters")]
    PathOverflow { path: String, max: usize },

    /// Session is already bound to a device
    #[error("Session is already open on {path}, close it first")]
    AlreadyOpen { path: String },

    /// Session has no open device
    #[error("Session is not open")]
    NotOpen,

    /// OS refused to open the device node
    #[error("Can't open device {path}: {source}")]
    DeviceOpenFailed {
        path: String,
        #[source]
        source: io::Error,
    },

    /// OS reported an error while closing the device node
    #[error("Failed to close {path}: {source}")]
    DeviceCloseFailed {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Reading back a device setting failed
    #[error("Can't get {setting}: {source}")]
    ConfigReadFailed {
        setting: ConfigSetting,
        #[source]
        source: io::Error,
    },

    /// A transmit element is not an unsigned 8-bit value
    #[error("Transmit data should be valid 8-bit data: element {index} is {value}")]
    InvalidByteValue { index: usize, value: i64 },

    /// Requested transfer is larger than the transfer buffers
    #[error("Transfer of {requested} bytes exceeds the maximum of {max} bytes")]
    TransferTooLarge { requested: usize, max: usize },

    /// The bus transaction itself failed
    #[error("Can't send spi message of {len} bytes: {source}")]
    TransferFailed {
        len: usize,
        #[source]
        source: io::Error,
    },
}

impl SpiError {
    /// Returns true for errors detected before any I/O was attempted
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::PathOverflow { .. }
                | Self::InvalidByteValue { .. }
                | Self::TransferTooLarge { .. }
        )
    }
}

/// Result type for spixfer-core operations
pub type Result<T> = std::result::Result<T, SpiError>;
