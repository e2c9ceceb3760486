//! Backend traits
//!
//! A session never talks to the OS directly. It goes through a
//! [`DeviceOpener`] that turns a device path into an open [`SpiDevice`],
//! which in turn provides the configuration read-back queries and the
//! full-duplex transaction primitive. `spixfer-linux` implements these on
//! top of spidev, `spixfer-dummy` in memory.

use crate::error::{ConfigSetting, Result, SpiError};
use crate::transfer::TransferDescriptor;
use std::io;

/// Default device path prefix (`/dev/spidevB.D`)
pub const DEFAULT_PATH_PREFIX: &str = "/dev/spidev";

/// Longest accepted device path, in characters
///
/// Bus/device pairs whose formatted path is longer than this are rejected
/// before any OS call is made.
pub const MAX_PATH_LEN: usize = 15;

/// Settings read back from a device right after it was opened
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceConfig {
    /// SPI mode flags
    pub mode: u8,
    /// Bits per word
    pub bits_per_word: u8,
    /// Maximum clock speed in Hz
    pub max_speed_hz: u32,
}

/// An open SPI device handle
pub trait SpiDevice {
    /// Read the device's current SPI mode
    fn read_mode(&self) -> io::Result<u8>;

    /// Read the device's current bits-per-word setting
    fn read_bits_per_word(&self) -> io::Result<u8>;

    /// Read the device's current maximum clock speed in Hz
    fn read_max_speed_hz(&self) -> io::Result<u32>;

    /// Perform one full-duplex block transfer
    ///
    /// Returns the number of bytes clocked. OS level failures are reported
    /// as `Err`.
    fn transfer(&mut self, xfer: &mut TransferDescriptor<'_>) -> io::Result<usize>;

    /// Release the handle, reporting any error from the OS
    fn close(self) -> io::Result<()>;
}

/// Opens devices by path
pub trait DeviceOpener {
    /// Device type produced by this opener
    type Device: SpiDevice;

    /// Path prefix that bus/device numbers are appended to
    fn path_prefix(&self) -> &str {
        DEFAULT_PATH_PREFIX
    }

    /// Open the device at `path` for simultaneous reading and writing
    fn open(&self, path: &str) -> io::Result<Self::Device>;
}

/// Format the device path for a bus/device pair
///
/// Produces `<prefix><bus>.<device>`, or [`SpiError::PathOverflow`] when the
/// result exceeds [`MAX_PATH_LEN`].
pub fn device_path(prefix: &str, bus: u32, device: u32) -> Result<String> {
    let path = format!("{}{}.{}", prefix, bus, device);
    if path.len() > MAX_PATH_LEN {
        return Err(SpiError::PathOverflow {
            path,
            max: MAX_PATH_LEN,
        });
    }
    Ok(path)
}

/// Query mode, bits per word and max speed from an open device
pub fn read_config<D: SpiDevice>(device: &D) -> Result<DeviceConfig> {
    let mode = device
        .read_mode()
        .map_err(|source| SpiError::ConfigReadFailed {
            setting: ConfigSetting::Mode,
            source,
        })?;
    let bits_per_word = device
        .read_bits_per_word()
        .map_err(|source| SpiError::ConfigReadFailed {
            setting: ConfigSetting::BitsPerWord,
            source,
        })?;
    let max_speed_hz = device
        .read_max_speed_hz()
        .map_err(|source| SpiError::ConfigReadFailed {
            setting: ConfigSetting::MaxSpeedHz,
            source,
        })?;

    Ok(DeviceConfig {
        mode,
        bits_per_word,
        max_speed_hz,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_path() {
        assert_eq!(device_path(DEFAULT_PATH_PREFIX, 0, 0).unwrap(), "/dev/spidev0.0");
        assert_eq!(device_path(DEFAULT_PATH_PREFIX, 1, 2).unwrap(), "/dev/spidev1.2");
        // Exactly at the bound
        assert_eq!(device_path(DEFAULT_PATH_PREFIX, 10, 1).unwrap(), "/dev/spidev10.1");
    }

    #[test]
    fn test_device_path_overflow() {
        let err = device_path(DEFAULT_PATH_PREFIX, 10, 10).unwrap_err();
        match err {
            SpiError::PathOverflow { path, max } => {
                assert_eq!(path, "/dev/spidev10.10");
                assert_eq!(max, MAX_PATH_LEN);
            }
            other => panic!("unexpected error: {}", other),
        }

        assert!(matches!(
            device_path(DEFAULT_PATH_PREFIX, u32::MAX, u32::MAX),
            Err(SpiError::PathOverflow { .. })
        ));
    }
}
