//! spixfer-linux - Linux spidev backend
//!
//! The Linux SPI driver exposes SPI controllers through character devices
//! at `/dev/spidevX.Y` where X is the bus number and Y is the chip select.
//! This crate implements the spixfer device traits on top of them.
//!
//! # Example
//!
//! ```no_run
//! use spixfer_linux::open_linux_spi;
//!
//! let mut session = open_linux_spi(0, 0)?;
//! println!(
//!     "mode={} bits={} speed={} Hz",
//!     session.mode(),
//!     session.bits_per_word(),
//!     session.max_speed_hz()
//! );
//!
//! // Send one command byte, read three more
//! let rx = session.transfer(&[0x9F], 4)?;
//! println!("{:02X?}", rx);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # System Requirements
//!
//! - Linux kernel with spidev support enabled (`CONFIG_SPI_SPIDEV`)
//! - Read/write access to `/dev/spidevX.Y` device
//! - May require adding user to `spi` group or using udev rules

pub mod device;

// Re-exports
pub use device::{Spidev, SpidevOpener};

use spixfer_core::{Result, SpiSession};

/// Session bound to a spidev node
pub type LinuxSpiSession = SpiSession<SpidevOpener>;

/// Open `/dev/spidev<bus>.<device>` in a new session
pub fn open_linux_spi(bus: u32, device: u32) -> Result<LinuxSpiSession> {
    SpiSession::open_new(SpidevOpener::default(), bus, device)
}
