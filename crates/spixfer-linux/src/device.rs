//! Linux spidev device implementation
//!
//! This module provides [`Spidev`], an open `/dev/spidevB.D` node, and
//! [`SpidevOpener`], which creates them for a session.

use spixfer_core::device::{DeviceOpener, SpiDevice, DEFAULT_PATH_PREFIX};
use spixfer_core::transfer::TransferDescriptor;

use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::io::{AsRawFd, IntoRawFd};

/// Linux spidev ioctl constants
mod ioctl {
    use super::SpiIocTransfer;
    use nix::{ioctl_read, ioctl_write_buf};

    // SPI ioctl magic number
    const SPI_IOC_MAGIC: u8 = b'k';

    // SPI ioctl type numbers
    const SPI_IOC_TYPE_MESSAGE: u8 = 0;
    const SPI_IOC_TYPE_MODE: u8 = 1;
    const SPI_IOC_TYPE_BITS_PER_WORD: u8 = 3;
    const SPI_IOC_TYPE_MAX_SPEED_HZ: u8 = 4;

    ioctl_read!(spi_ioc_rd_mode, SPI_IOC_MAGIC, SPI_IOC_TYPE_MODE, u8);
    ioctl_read!(
        spi_ioc_rd_bits_per_word,
        SPI_IOC_MAGIC,
        SPI_IOC_TYPE_BITS_PER_WORD,
        u8
    );
    ioctl_read!(
        spi_ioc_rd_max_speed_hz,
        SPI_IOC_MAGIC,
        SPI_IOC_TYPE_MAX_SPEED_HZ,
        u32
    );

    // SPI_IOC_MESSAGE(n) = _IOW(SPI_IOC_MAGIC, 0, char[n * sizeof(struct spi_ioc_transfer)])
    ioctl_write_buf!(
        spi_ioc_message,
        SPI_IOC_MAGIC,
        SPI_IOC_TYPE_MESSAGE,
        SpiIocTransfer
    );
}

/// SPI transfer structure for ioctl
/// This must match the kernel's struct spi_ioc_transfer layout
#[repr(C)]
#[derive(Debug, Default, Clone)]
pub(crate) struct SpiIocTransfer {
    tx_buf: u64,          // __u64 tx_buf
    rx_buf: u64,          // __u64 rx_buf
    len: u32,             // __u32 len
    speed_hz: u32,        // __u32 speed_hz
    delay_usecs: u16,     // __u16 delay_usecs
    bits_per_word: u8,    // __u8 bits_per_word
    cs_change: u8,        // __u8 cs_change
    tx_nbits: u8,         // __u8 tx_nbits
    rx_nbits: u8,         // __u8 rx_nbits
    word_delay_usecs: u8, // __u8 word_delay_usecs
    _pad: u8,             // padding
}

impl SpiIocTransfer {
    /// Point a kernel transfer at the descriptor's buffers
    ///
    /// The result holds raw addresses into `xfer` and must not outlive it.
    fn from_descriptor(xfer: &mut TransferDescriptor<'_>) -> Self {
        Self {
            tx_buf: xfer.tx_buf.as_ptr() as u64,
            rx_buf: xfer.rx_buf.as_mut_ptr() as u64,
            len: xfer.len() as u32,
            speed_hz: xfer.speed_hz,
            delay_usecs: xfer.delay_usecs,
            bits_per_word: xfer.bits_per_word,
            ..Default::default()
        }
    }
}

/// Opens spidev nodes
#[derive(Debug, Clone)]
pub struct SpidevOpener {
    prefix: String,
}

impl Default for SpidevOpener {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PATH_PREFIX.to_string(),
        }
    }
}

impl SpidevOpener {
    /// Use a different path prefix (for example under a chroot)
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl DeviceOpener for SpidevOpener {
    type Device = Spidev;

    fn path_prefix(&self) -> &str {
        &self.prefix
    }

    fn open(&self, path: &str) -> io::Result<Spidev> {
        Spidev::open(path)
    }
}

/// An open spidev character device
#[derive(Debug)]
pub struct Spidev {
    /// File handle for spidev device
    file: File,
}

impl Spidev {
    /// Open a spidev node read/write
    pub fn open(path: &str) -> io::Result<Self> {
        log::debug!("linux_spi: Opening device {}", path);

        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Self { file })
    }
}

impl SpiDevice for Spidev {
    fn read_mode(&self) -> io::Result<u8> {
        let mut mode: u8 = 0;
        unsafe { ioctl::spi_ioc_rd_mode(self.file.as_raw_fd(), &mut mode) }?;
        Ok(mode)
    }

    fn read_bits_per_word(&self) -> io::Result<u8> {
        let mut bits: u8 = 0;
        unsafe { ioctl::spi_ioc_rd_bits_per_word(self.file.as_raw_fd(), &mut bits) }?;
        Ok(bits)
    }

    fn read_max_speed_hz(&self) -> io::Result<u32> {
        let mut speed: u32 = 0;
        unsafe { ioctl::spi_ioc_rd_max_speed_hz(self.file.as_raw_fd(), &mut speed) }?;
        Ok(speed)
    }

    fn transfer(&mut self, xfer: &mut TransferDescriptor<'_>) -> io::Result<usize> {
        let message = [SpiIocTransfer::from_descriptor(xfer)];

        // SAFETY: the transfer points into `xfer`, whose buffers are both
        // `len` bytes long and stay borrowed for the duration of the call.
        let ret = unsafe { ioctl::spi_ioc_message(self.file.as_raw_fd(), &message) }?;

        log::debug!("linux_spi: Transferred {} of {} bytes", ret, xfer.len());
        Ok(ret.max(0) as usize)
    }

    fn close(self) -> io::Result<()> {
        let fd = self.file.into_raw_fd();
        nix::unistd::close(fd)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spixfer_core::error::{ConfigSetting, SpiError};
    use spixfer_core::{SpiSession, TransferParams};
    use std::mem::{offset_of, size_of};

    #[test]
    fn test_transfer_struct_layout() {
        assert_eq!(size_of::<SpiIocTransfer>(), 32);
        assert_eq!(offset_of!(SpiIocTransfer, rx_buf), 8);
        assert_eq!(offset_of!(SpiIocTransfer, len), 16);
        assert_eq!(offset_of!(SpiIocTransfer, speed_hz), 20);
        assert_eq!(offset_of!(SpiIocTransfer, delay_usecs), 24);
        assert_eq!(offset_of!(SpiIocTransfer, bits_per_word), 26);
        assert_eq!(offset_of!(SpiIocTransfer, word_delay_usecs), 30);
    }

    #[test]
    fn test_from_descriptor() {
        let tx = [1u8, 2, 3, 0];
        let mut rx = [0u8; 4];
        let tx_addr = tx.as_ptr() as u64;
        let rx_addr = rx.as_ptr() as u64;
        let params = TransferParams::default();

        let mut xfer = TransferDescriptor {
            tx_buf: &tx,
            rx_buf: &mut rx,
            delay_usecs: params.delay_usecs,
            speed_hz: params.speed_hz,
            bits_per_word: params.bits_per_word,
        };
        let kernel = SpiIocTransfer::from_descriptor(&mut xfer);

        assert_eq!(kernel.tx_buf, tx_addr);
        assert_eq!(kernel.rx_buf, rx_addr);
        assert_eq!(kernel.len, 4);
        assert_eq!(kernel.speed_hz, 1_000_000);
        assert_eq!(kernel.delay_usecs, 5);
        assert_eq!(kernel.bits_per_word, 8);
        assert_eq!(kernel.cs_change, 0);
    }

    #[test]
    fn test_open_missing_device() {
        let opener = SpidevOpener::with_prefix("/nonexistent/spi");
        let mut session = SpiSession::new(opener);

        let err = session.open(0, 0).unwrap_err();
        match err {
            SpiError::DeviceOpenFailed { path, source } => {
                assert_eq!(path, "/nonexistent/spi0.0");
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(!session.is_open());
    }

    #[test]
    fn test_config_read_on_non_spi_node() {
        // /dev/null accepts the open but rejects spidev ioctls
        let dev = Spidev::open("/dev/null").unwrap();
        assert!(dev.read_mode().is_err());

        let err = spixfer_core::device::read_config(&dev).unwrap_err();
        assert!(matches!(
            err,
            SpiError::ConfigReadFailed {
                setting: ConfigSetting::Mode,
                ..
            }
        ));
        dev.close().unwrap();
    }
}
