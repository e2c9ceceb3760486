//! Full-duplex transfer engine
//!
//! A transfer clocks `max(tx_data.len(), min_rx)` bytes in each direction.
//! Transmit data shorter than that is padded with zeros, which lets a caller
//! send a one byte command and read back several response bytes in the same
//! transaction.
//!
//! Both buffers live on the stack and are bounded by
//! [`MAX_TRANSFER_LENGTH`]. All validation happens before the device is
//! touched.

use crate::device::{DeviceConfig, DeviceOpener, SpiDevice};
use crate::error::{Result, SpiError};
use crate::session::SpiSession;
use std::io;

/// Capacity of the transmit and receive buffers, in bytes
pub const MAX_TRANSFER_LENGTH: usize = 256;

/// Default clock speed in Hz (1 MHz)
pub const DEFAULT_SPEED_HZ: u32 = 1_000_000;

/// Default delay after the transfer, in microseconds
pub const DEFAULT_DELAY_USECS: u16 = 5;

/// Default word size
pub const DEFAULT_BITS_PER_WORD: u8 = 8;

/// Clocking parameters applied to a single transfer
///
/// These are independent of the settings read back when the session was
/// opened. Use [`TransferParams::from_device`] to reuse those instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferParams {
    /// Clock speed in Hz
    pub speed_hz: u32,
    /// Delay after the transfer before chip select changes, in microseconds
    pub delay_usecs: u16,
    /// Bits per word
    pub bits_per_word: u8,
}

impl Default for TransferParams {
    fn default() -> Self {
        Self {
            speed_hz: DEFAULT_SPEED_HZ,
            delay_usecs: DEFAULT_DELAY_USECS,
            bits_per_word: DEFAULT_BITS_PER_WORD,
        }
    }
}

impl TransferParams {
    /// Take speed and word size from a device's cached settings
    ///
    /// The delay keeps its default.
    pub fn from_device(config: &DeviceConfig) -> Self {
        Self {
            speed_hz: config.max_speed_hz,
            bits_per_word: config.bits_per_word,
            ..Default::default()
        }
    }

    /// Set the clock speed in Hz
    pub fn with_speed(mut self, speed_hz: u32) -> Self {
        self.speed_hz = speed_hz;
        self
    }

    /// Set the post-transfer delay in microseconds
    pub fn with_delay(mut self, delay_usecs: u16) -> Self {
        self.delay_usecs = delay_usecs;
        self
    }

    /// Set the word size
    pub fn with_bits_per_word(mut self, bits_per_word: u8) -> Self {
        self.bits_per_word = bits_per_word;
        self
    }
}

/// Description of one duplex exchange
///
/// Built fresh for every transfer. `tx_buf` and `rx_buf` always have the
/// same length.
#[derive(Debug)]
pub struct TransferDescriptor<'a> {
    /// Bytes clocked out
    pub tx_buf: &'a [u8],
    /// Bytes clocked in
    pub rx_buf: &'a mut [u8],
    /// Delay after the transfer, in microseconds
    pub delay_usecs: u16,
    /// Clock speed in Hz
    pub speed_hz: u32,
    /// Bits per word
    pub bits_per_word: u8,
}

impl<'a> TransferDescriptor<'a> {
    fn new(tx_buf: &'a [u8], rx_buf: &'a mut [u8], params: &TransferParams) -> Self {
        debug_assert_eq!(tx_buf.len(), rx_buf.len());
        Self {
            tx_buf,
            rx_buf,
            delay_usecs: params.delay_usecs,
            speed_hz: params.speed_hz,
            bits_per_word: params.bits_per_word,
        }
    }

    /// Number of bytes clocked in each direction
    pub fn len(&self) -> usize {
        self.tx_buf.len()
    }

    /// Returns true for a zero-length transfer
    pub fn is_empty(&self) -> bool {
        self.tx_buf.is_empty()
    }
}

/// Transfer `tx_data` with the default parameters
///
/// Every element must be in `0..=255`. Returns the received bytes, exactly
/// `max(tx_data.len(), min_rx)` of them.
pub fn transfer<O: DeviceOpener>(
    session: &mut SpiSession<O>,
    tx_data: &[i64],
    min_rx: usize,
) -> Result<Vec<u8>> {
    transfer_with(session, tx_data, min_rx, &TransferParams::default())
}

/// Transfer `tx_data` with explicit parameters
pub fn transfer_with<O: DeviceOpener>(
    session: &mut SpiSession<O>,
    tx_data: &[i64],
    min_rx: usize,
    params: &TransferParams,
) -> Result<Vec<u8>> {
    let mut tx_buf = [0u8; MAX_TRANSFER_LENGTH];

    for (index, &value) in tx_data.iter().enumerate() {
        let byte = u8::try_from(value).map_err(|_| SpiError::InvalidByteValue { index, value })?;
        if let Some(slot) = tx_buf.get_mut(index) {
            *slot = byte;
        }
    }
    check_capacity(tx_data.len())?;

    exchange(session, &tx_buf, tx_data.len(), min_rx, params)
}

/// Transfer already typed bytes with the default parameters
///
/// Same as [`transfer`] without the per-element range check.
pub fn transfer_bytes<O: DeviceOpener>(
    session: &mut SpiSession<O>,
    tx_data: &[u8],
    min_rx: usize,
) -> Result<Vec<u8>> {
    check_capacity(tx_data.len())?;

    let mut tx_buf = [0u8; MAX_TRANSFER_LENGTH];
    tx_buf[..tx_data.len()].copy_from_slice(tx_data);

    exchange(session, &tx_buf, tx_data.len(), min_rx, &TransferParams::default())
}

fn check_capacity(requested: usize) -> Result<()> {
    if requested > MAX_TRANSFER_LENGTH {
        return Err(SpiError::TransferTooLarge {
            requested,
            max: MAX_TRANSFER_LENGTH,
        });
    }
    Ok(())
}

/// Run one transaction. Bytes of `tx_buf` past `tx_len` must be zero.
fn exchange<O: DeviceOpener>(
    session: &mut SpiSession<O>,
    tx_buf: &[u8; MAX_TRANSFER_LENGTH],
    tx_len: usize,
    min_rx: usize,
    params: &TransferParams,
) -> Result<Vec<u8>> {
    check_capacity(min_rx)?;
    let len = tx_len.max(min_rx);

    let device = session.device_mut()?;

    if len == 0 {
        log::debug!("spixfer: Zero-length transfer, nothing to do");
        return Ok(Vec::new());
    }

    let mut rx_buf = [0u8; MAX_TRANSFER_LENGTH];
    let mut xfer = TransferDescriptor::new(&tx_buf[..len], &mut rx_buf[..len], params);

    log::trace!("spixfer: TX: {:02X?}", xfer.tx_buf);

    match device.transfer(&mut xfer) {
        Ok(0) => {
            return Err(SpiError::TransferFailed {
                len,
                source: io::Error::new(io::ErrorKind::WriteZero, "no bytes transferred"),
            });
        }
        Ok(count) if count < len => {
            log::warn!("spixfer: Short transfer: {} of {} bytes", count, len);
        }
        Ok(_) => {}
        Err(source) => return Err(SpiError::TransferFailed { len, source }),
    }

    log::trace!("spixfer: RX: {:02X?}", &rx_buf[..len]);

    Ok(rx_buf[..len].to_vec())
}
