//! spixfer-core - SPI device sessions and full-duplex transfers
//!
//! This crate provides the hardware independent part of spixfer: a
//! [`SpiSession`] bound to one bus/device pair and a transfer engine that
//! turns a sequence of byte values into a single duplex transaction.
//!
//! The OS side lives behind the [`DeviceOpener`] and [`SpiDevice`] traits.
//! `spixfer-linux` implements them for `/dev/spidevB.D` nodes and
//! `spixfer-dummy` provides an in-memory device for testing.
//!
//! # Example
//!
//! ```ignore
//! use spixfer_core::SpiSession;
//! use spixfer_linux::SpidevOpener;
//!
//! let mut session = SpiSession::open_new(SpidevOpener::default(), 0, 0)?;
//!
//! // One command byte, four response bytes
//! let rx = session.transfer(&[0x9F], 4)?;
//! println!("{:02X?}", rx);
//!
//! session.close()?;
//! ```
//!
//! # Concurrency
//!
//! Transfers block the calling thread until the bus transaction completes and
//! no timeout is applied. A session is not synchronized; concurrent use of
//! one session must be serialized by the caller.

#![warn(rust_2018_idioms)]

pub mod config;
pub mod device;
pub mod error;
pub mod mode;
pub mod session;
pub mod transfer;

#[cfg(test)]
mod mock;

pub use config::{parse_options, SessionConfig};
pub use device::{DeviceConfig, DeviceOpener, SpiDevice};
pub use error::{ConfigSetting, Result, SpiError};
pub use mode::SpiModeFlags;
pub use session::SpiSession;
pub use transfer::{
    transfer, transfer_bytes, transfer_with, TransferDescriptor, TransferParams,
    MAX_TRANSFER_LENGTH,
};
