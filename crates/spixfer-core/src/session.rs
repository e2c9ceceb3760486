//! Device session
//!
//! A [`SpiSession`] is bound to at most one bus/device pair at a time and
//! exclusively owns the open device handle. Mode, bits per word and max
//! speed are read back from the device when it is opened and cleared again
//! when it is closed.
//!
//! Sessions are not synchronized. Callers sharing one across threads must
//! serialize access themselves (for example with one `Mutex` per session).

use crate::device::{device_path, read_config, DeviceConfig, DeviceOpener, SpiDevice};
use crate::error::{Result, SpiError};
use crate::mode::SpiModeFlags;
use crate::transfer::{self, TransferParams};

/// One binding to a bus/device pair
pub struct SpiSession<O: DeviceOpener> {
    opener: O,
    /// Open device, `None` while closed
    device: Option<O::Device>,
    path: Option<String>,
    config: DeviceConfig,
}

impl<O: DeviceOpener> SpiSession<O> {
    /// Create a closed session
    pub fn new(opener: O) -> Self {
        Self {
            opener,
            device: None,
            path: None,
            config: DeviceConfig::default(),
        }
    }

    /// Create a session and open `bus`/`device` right away
    pub fn open_new(opener: O, bus: u32, device: u32) -> Result<Self> {
        let mut session = Self::new(opener);
        session.open(bus, device)?;
        Ok(session)
    }

    /// Bind the session to a bus/device pair
    ///
    /// The device's current mode, bits per word and max speed are read back
    /// and cached. On any failure the session stays closed.
    pub fn open(&mut self, bus: u32, device: u32) -> Result<()> {
        if self.device.is_some() {
            return Err(SpiError::AlreadyOpen {
                path: self.path.clone().unwrap_or_default(),
            });
        }

        let path = device_path(self.opener.path_prefix(), bus, device)?;

        log::debug!("spixfer: Opening device {}", path);

        let handle = self
            .opener
            .open(&path)
            .map_err(|source| SpiError::DeviceOpenFailed {
                path: path.clone(),
                source,
            })?;

        let config = match read_config(&handle) {
            Ok(config) => config,
            Err(e) => {
                if let Err(close_err) = handle.close() {
                    log::warn!("spixfer: Failed to close {} after error: {}", path, close_err);
                }
                return Err(e);
            }
        };

        log::info!(
            "spixfer: Opened {} (mode={:#04x}, bits={}, speed={} kHz)",
            path,
            config.mode,
            config.bits_per_word,
            config.max_speed_hz / 1000
        );

        self.device = Some(handle);
        self.path = Some(path);
        self.config = config;
        Ok(())
    }

    /// Release the device
    ///
    /// The session is reset to closed even when the OS reports an error.
    /// Closing a closed session does nothing.
    pub fn close(&mut self) -> Result<()> {
        let handle = self.device.take();
        let path = self.path.take().unwrap_or_default();
        self.config = DeviceConfig::default();

        let Some(handle) = handle else {
            return Ok(());
        };

        log::debug!("spixfer: Closing {}", path);
        handle
            .close()
            .map_err(|source| SpiError::DeviceCloseFailed { path, source })
    }

    /// Returns true while bound to a device
    pub fn is_open(&self) -> bool {
        self.device.is_some()
    }

    /// Path of the open device
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Cached device settings (all zero while closed)
    pub fn config(&self) -> DeviceConfig {
        self.config
    }

    /// Cached SPI mode byte
    pub fn mode(&self) -> u8 {
        self.config.mode
    }

    /// Cached SPI mode as flags
    pub fn mode_flags(&self) -> SpiModeFlags {
        SpiModeFlags::from_bits_retain(self.config.mode)
    }

    /// Cached bits per word
    pub fn bits_per_word(&self) -> u8 {
        self.config.bits_per_word
    }

    /// Cached maximum clock speed in Hz
    pub fn max_speed_hz(&self) -> u32 {
        self.config.max_speed_hz
    }

    /// Opener used to bind devices
    pub fn opener(&self) -> &O {
        &self.opener
    }

    /// Full-duplex transfer with the default transfer parameters
    ///
    /// See [`transfer::transfer`].
    pub fn transfer(&mut self, tx_data: &[i64], min_rx: usize) -> Result<Vec<u8>> {
        transfer::transfer(self, tx_data, min_rx)
    }

    /// Full-duplex transfer with explicit transfer parameters
    pub fn transfer_with(
        &mut self,
        tx_data: &[i64],
        min_rx: usize,
        params: &TransferParams,
    ) -> Result<Vec<u8>> {
        transfer::transfer_with(self, tx_data, min_rx, params)
    }

    pub(crate) fn device_mut(&mut self) -> Result<&mut O::Device> {
        self.device.as_mut().ok_or(SpiError::NotOpen)
    }
}

impl<O: DeviceOpener> Drop for SpiSession<O> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("spixfer: {}", e);
        }
    }
}

impl<O: DeviceOpener> core::fmt::Debug for SpiSession<O> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SpiSession")
            .field("path", &self.path)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigSetting;
    use crate::mock::{MockFault, MockOpener};

    #[test]
    fn test_new_session_is_closed() {
        let session = SpiSession::new(MockOpener::default());
        assert!(!session.is_open());
        assert_eq!(session.path(), None);
        assert_eq!(session.config(), DeviceConfig::default());
    }

    #[test]
    fn test_open_reads_back_config() {
        let opener = MockOpener::default().with_config(DeviceConfig {
            mode: 3,
            bits_per_word: 8,
            max_speed_hz: 500_000,
        });
        let session = SpiSession::open_new(opener, 0, 0).unwrap();

        assert!(session.is_open());
        assert_eq!(session.path(), Some("/dev/spidev0.0"));
        assert_eq!(session.mode(), 3);
        assert_eq!(session.mode_flags().clock_mode(), 3);
        assert_eq!(session.bits_per_word(), 8);
        assert_eq!(session.max_speed_hz(), 500_000);
        assert_eq!(session.opener().opened(), vec!["/dev/spidev0.0".to_string()]);
    }

    #[test]
    fn test_open_path_overflow_skips_os() {
        let mut session = SpiSession::new(MockOpener::default());
        let err = session.open(100, 100).unwrap_err();
        assert!(matches!(err, SpiError::PathOverflow { .. }));
        assert!(session.opener().opened().is_empty());
        assert!(!session.is_open());
    }

    #[test]
    fn test_open_twice_rejected() {
        let mut session = SpiSession::open_new(MockOpener::default(), 0, 1).unwrap();
        let err = session.open(0, 0).unwrap_err();
        match err {
            SpiError::AlreadyOpen { path } => assert_eq!(path, "/dev/spidev0.1"),
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(session.path(), Some("/dev/spidev0.1"));
        assert_eq!(session.opener().opened().len(), 1);
    }

    #[test]
    fn test_open_failure_leaves_closed() {
        let opener = MockOpener::default().with_fault(MockFault::Open);
        let mut session = SpiSession::new(opener);
        let err = session.open(1, 0).unwrap_err();
        match err {
            SpiError::DeviceOpenFailed { path, .. } => assert_eq!(path, "/dev/spidev1.0"),
            other => panic!("unexpected error: {}", other),
        }
        assert!(!session.is_open());
    }

    #[test]
    fn test_config_read_failure_closes_handle() {
        for (fault, setting) in [
            (MockFault::ReadMode, ConfigSetting::Mode),
            (MockFault::ReadBitsPerWord, ConfigSetting::BitsPerWord),
            (MockFault::ReadMaxSpeed, ConfigSetting::MaxSpeedHz),
        ] {
            let opener = MockOpener::default().with_fault(fault);
            let mut session = SpiSession::new(opener);
            let err = session.open(0, 0).unwrap_err();
            match err {
                SpiError::ConfigReadFailed { setting: s, .. } => assert_eq!(s, setting),
                other => panic!("unexpected error: {}", other),
            }
            assert!(!session.is_open());
            assert_eq!(session.config(), DeviceConfig::default());
            assert_eq!(session.opener().closed(), 1);
        }
    }

    #[test]
    fn test_close_resets_state() {
        let mut session = SpiSession::open_new(MockOpener::default(), 0, 0).unwrap();
        session.close().unwrap();

        assert!(!session.is_open());
        assert_eq!(session.path(), None);
        assert_eq!(session.mode(), 0);
        assert_eq!(session.bits_per_word(), 0);
        assert_eq!(session.max_speed_hz(), 0);
        assert_eq!(session.opener().closed(), 1);

        // Closing again is a no-op
        session.close().unwrap();
        assert_eq!(session.opener().closed(), 1);
    }

    #[test]
    fn test_close_failure_still_resets() {
        let opener = MockOpener::default().with_fault(MockFault::Close);
        let mut session = SpiSession::open_new(opener, 0, 0).unwrap();

        let err = session.close().unwrap_err();
        assert!(matches!(err, SpiError::DeviceCloseFailed { .. }));
        assert!(!session.is_open());
        assert_eq!(session.config(), DeviceConfig::default());

        // Reopening works after the failed close
        session.open(0, 0).unwrap();
        assert!(session.is_open());
    }

    #[test]
    fn test_drop_closes_device() {
        let opener = MockOpener::default();
        {
            let _session = SpiSession::open_new(opener.clone(), 0, 0).unwrap();
        }
        assert_eq!(opener.closed(), 1);
    }
}
