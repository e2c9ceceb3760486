//! SPI mode flags
//!
//! The device reports its mode as a single byte. Bit values follow
//! `<linux/spi/spidev.h>`.

use bitflags::bitflags;

/// SPI mode 0: CPOL=0, CPHA=0
pub const MODE_0: u8 = 0;
/// SPI mode 1: CPOL=0, CPHA=1
pub const MODE_1: u8 = SpiModeFlags::CPHA.bits();
/// SPI mode 2: CPOL=1, CPHA=0
pub const MODE_2: u8 = SpiModeFlags::CPOL.bits();
/// SPI mode 3: CPOL=1, CPHA=1
pub const MODE_3: u8 = SpiModeFlags::CPOL.bits() | SpiModeFlags::CPHA.bits();

bitflags! {
    /// Flags carried in the 8-bit SPI mode byte
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SpiModeFlags: u8 {
        /// Clock phase
        const CPHA      = 0x01;
        /// Clock polarity
        const CPOL      = 0x02;
        /// Chip select is active high
        const CS_HIGH   = 0x04;
        /// Words are clocked least significant bit first
        const LSB_FIRST = 0x08;
        /// SI/SO signals shared
        const THREE_WIRE = 0x10;
        /// Loopback mode
        const LOOP      = 0x20;
        /// No chip select line
        const NO_CS     = 0x40;
        /// Peripheral pulls low to pause
        const READY     = 0x80;
    }
}

impl SpiModeFlags {
    /// Clock mode number (0-3) encoded by CPOL and CPHA
    pub fn clock_mode(self) -> u8 {
        (self & (Self::CPOL | Self::CPHA)).bits()
    }
}
