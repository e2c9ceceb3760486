//! spixfer-dummy - In-memory SPI device for testing
//!
//! This crate provides a device backend that never touches hardware. It can
//! echo transmitted bytes back (a loopback wire between MOSI and MISO), drive
//! a constant level, or play back a fixed response. Faults can be injected at
//! every point where a real device can fail, and every transfer is recorded
//! for later inspection.

use spixfer_core::device::{DeviceConfig, DeviceOpener, SpiDevice};
use spixfer_core::transfer::TransferDescriptor;

use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// What the dummy device clocks back in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Received bytes equal transmitted bytes
    Loopback,
    /// Every received byte has this value
    Fill(u8),
    /// Received bytes come from this buffer, zero past its end
    Fixed(Vec<u8>),
}

/// Operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Opening the device node
    Open,
    /// Reading the SPI mode
    ReadMode,
    /// Reading bits per word
    ReadBitsPerWord,
    /// Reading the max speed
    ReadMaxSpeed,
    /// Transfer completes but reports zero bytes
    TransferZero,
    /// Transfer fails with an OS error
    TransferError,
    /// Closing the device node
    Close,
}

/// Configuration for the dummy device
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Settings reported on read-back
    pub device: DeviceConfig,
    /// Receive behaviour
    pub response: Response,
    /// Injected faults
    pub faults: Vec<Fault>,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            device: DeviceConfig {
                mode: 0,
                bits_per_word: 8,
                max_speed_hz: 10_000_000,
            },
            response: Response::Loopback,
            faults: Vec::new(),
        }
    }
}

impl DummyConfig {
    /// Set the settings reported on read-back
    pub fn with_device_config(mut self, device: DeviceConfig) -> Self {
        self.device = device;
        self
    }

    /// Set the receive behaviour
    pub fn with_response(mut self, response: Response) -> Self {
        self.response = response;
        self
    }

    /// Add an injected fault
    pub fn with_fault(mut self, fault: Fault) -> Self {
        self.faults.push(fault);
        self
    }

    fn has_fault(&self, fault: Fault) -> bool {
        self.faults.contains(&fault)
    }
}

/// Parse dummy specific options
///
/// - `fill=<byte>` - answer every byte with this value (decimal or `0x` hex)
pub fn parse_options(options: &[(&str, &str)]) -> Result<DummyConfig, String> {
    let mut config = DummyConfig::default();

    for (key, value) in options {
        match *key {
            "fill" => {
                let byte =
                    parse_byte(value).ok_or_else(|| format!("Invalid fill value: {}", value))?;
                config.response = Response::Fill(byte);
            }
            _ => {
                log::warn!("dummy: Unknown option: {}={}", key, value);
            }
        }
    }

    Ok(config)
}

fn parse_byte(s: &str) -> Option<u8> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

/// One recorded transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedTransfer {
    /// Device path the transfer went to
    pub path: String,
    /// Bytes clocked out, including padding
    pub tx: Vec<u8>,
    /// Clock speed in Hz
    pub speed_hz: u32,
    /// Delay in microseconds
    pub delay_usecs: u16,
    /// Bits per word
    pub bits_per_word: u8,
}

#[derive(Debug, Default)]
struct DummyLog {
    opened: Vec<String>,
    closed: Vec<String>,
    transfers: Vec<RecordedTransfer>,
}

/// Dummy device opener
///
/// Clones share their recorded history, so a test can hand one clone to a
/// session and inspect another.
#[derive(Debug, Clone, Default)]
pub struct DummyBus {
    config: DummyConfig,
    log: Arc<Mutex<DummyLog>>,
}

impl DummyBus {
    /// Create a dummy bus with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        Self {
            config,
            log: Arc::default(),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Paths opened so far, in order
    pub fn opened(&self) -> Vec<String> {
        self.lock().opened.clone()
    }

    /// Paths closed so far, in order
    pub fn closed(&self) -> Vec<String> {
        self.lock().closed.clone()
    }

    /// Transactions performed so far, in order
    pub fn transfers(&self) -> Vec<RecordedTransfer> {
        self.lock().transfers.clone()
    }

    fn lock(&self) -> MutexGuard<'_, DummyLog> {
        lock_log(&self.log)
    }
}

fn lock_log(log: &Mutex<DummyLog>) -> MutexGuard<'_, DummyLog> {
    log.lock().unwrap_or_else(PoisonError::into_inner)
}

impl DeviceOpener for DummyBus {
    type Device = DummyDevice;

    fn open(&self, path: &str) -> io::Result<DummyDevice> {
        if self.config.has_fault(Fault::Open) {
            return Err(io::Error::from(io::ErrorKind::NotFound));
        }

        log::debug!("dummy: Opened {}", path);
        self.lock().opened.push(path.to_string());

        Ok(DummyDevice {
            path: path.to_string(),
            config: self.config.clone(),
            log: Arc::clone(&self.log),
        })
    }
}

/// An open dummy device
#[derive(Debug)]
pub struct DummyDevice {
    path: String,
    config: DummyConfig,
    log: Arc<Mutex<DummyLog>>,
}

impl DummyDevice {
    fn fail_if(&self, fault: Fault) -> io::Result<()> {
        if self.config.has_fault(fault) {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("injected fault: {:?}", fault),
            ));
        }
        Ok(())
    }

    fn respond(&self, tx: &[u8], rx: &mut [u8]) {
        match &self.config.response {
            Response::Loopback => rx.copy_from_slice(tx),
            Response::Fill(byte) => rx.fill(*byte),
            Response::Fixed(data) => {
                rx.fill(0);
                let len = core::cmp::min(data.len(), rx.len());
                rx[..len].copy_from_slice(&data[..len]);
            }
        }
    }
}

impl SpiDevice for DummyDevice {
    fn read_mode(&self) -> io::Result<u8> {
        self.fail_if(Fault::ReadMode)?;
        Ok(self.config.device.mode)
    }

    fn read_bits_per_word(&self) -> io::Result<u8> {
        self.fail_if(Fault::ReadBitsPerWord)?;
        Ok(self.config.device.bits_per_word)
    }

    fn read_max_speed_hz(&self) -> io::Result<u32> {
        self.fail_if(Fault::ReadMaxSpeed)?;
        Ok(self.config.device.max_speed_hz)
    }

    fn transfer(&mut self, xfer: &mut TransferDescriptor<'_>) -> io::Result<usize> {
        self.fail_if(Fault::TransferError)?;

        lock_log(&self.log).transfers.push(RecordedTransfer {
            path: self.path.clone(),
            tx: xfer.tx_buf.to_vec(),
            speed_hz: xfer.speed_hz,
            delay_usecs: xfer.delay_usecs,
            bits_per_word: xfer.bits_per_word,
        });

        if self.config.has_fault(Fault::TransferZero) {
            return Ok(0);
        }

        self.respond(xfer.tx_buf, xfer.rx_buf);
        Ok(xfer.len())
    }

    fn close(self) -> io::Result<()> {
        lock_log(&self.log).closed.push(self.path.clone());
        self.fail_if(Fault::Close)
    }
}
