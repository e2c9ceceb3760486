//! Loopback backend for unit tests

use crate::device::{DeviceConfig, DeviceOpener, SpiDevice};
use crate::transfer::TransferDescriptor;
use std::cell::RefCell;
use std::io;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFault {
    Open,
    ReadMode,
    ReadBitsPerWord,
    ReadMaxSpeed,
    TransferZero,
    TransferError,
    Close,
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub tx: Vec<u8>,
    pub speed_hz: u32,
    pub delay_usecs: u16,
    pub bits_per_word: u8,
}

#[derive(Default)]
struct MockLog {
    opened: Vec<String>,
    closed: usize,
    transfers: Vec<Recorded>,
}

#[derive(Clone)]
pub struct MockOpener {
    config: DeviceConfig,
    faults: Vec<MockFault>,
    log: Rc<RefCell<MockLog>>,
}

impl Default for MockOpener {
    fn default() -> Self {
        Self {
            config: DeviceConfig {
                mode: 0,
                bits_per_word: 8,
                max_speed_hz: 1_000_000,
            },
            faults: Vec::new(),
            log: Rc::default(),
        }
    }
}

impl MockOpener {
    pub fn with_config(mut self, config: DeviceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_fault(mut self, fault: MockFault) -> Self {
        self.faults.push(fault);
        self
    }

    pub fn opened(&self) -> Vec<String> {
        self.log.borrow().opened.clone()
    }

    pub fn closed(&self) -> usize {
        self.log.borrow().closed
    }

    pub fn transfers(&self) -> Vec<Recorded> {
        self.log.borrow().transfers.clone()
    }
}

pub struct MockDevice {
    config: DeviceConfig,
    faults: Vec<MockFault>,
    log: Rc<RefCell<MockLog>>,
}

impl MockDevice {
    fn check(&self, fault: MockFault) -> io::Result<()> {
        if self.faults.contains(&fault) {
            return Err(io::Error::new(io::ErrorKind::Other, format!("{:?}", fault)));
        }
        Ok(())
    }
}

impl DeviceOpener for MockOpener {
    type Device = MockDevice;

    fn open(&self, path: &str) -> io::Result<MockDevice> {
        if self.faults.contains(&MockFault::Open) {
            return Err(io::Error::from(io::ErrorKind::NotFound));
        }
        self.log.borrow_mut().opened.push(path.to_string());
        Ok(MockDevice {
            config: self.config,
            faults: self.faults.clone(),
            log: Rc::clone(&self.log),
        })
    }
}

impl SpiDevice for MockDevice {
    fn read_mode(&self) -> io::Result<u8> {
        self.check(MockFault::ReadMode)?;
        Ok(self.config.mode)
    }

    fn read_bits_per_word(&self) -> io::Result<u8> {
        self.check(MockFault::ReadBitsPerWord)?;
        Ok(self.config.bits_per_word)
    }

    fn read_max_speed_hz(&self) -> io::Result<u32> {
        self.check(MockFault::ReadMaxSpeed)?;
        Ok(self.config.max_speed_hz)
    }

    fn transfer(&mut self, xfer: &mut TransferDescriptor<'_>) -> io::Result<usize> {
        self.check(MockFault::TransferError)?;
        self.log.borrow_mut().transfers.push(Recorded {
            tx: xfer.tx_buf.to_vec(),
            speed_hz: xfer.speed_hz,
            delay_usecs: xfer.delay_usecs,
            bits_per_word: xfer.bits_per_word,
        });
        if self.faults.contains(&MockFault::TransferZero) {
            return Ok(0);
        }
        xfer.rx_buf.copy_from_slice(xfer.tx_buf);
        Ok(xfer.len())
    }

    fn close(self) -> io::Result<()> {
        self.log.borrow_mut().closed += 1;
        self.check(MockFault::Close)
    }
}
