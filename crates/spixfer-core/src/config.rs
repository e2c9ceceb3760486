//! Session configuration from key/value options
//!
//! Programmer strings such as `linux_spi:bus=1,cs=0,speed=500000` are split
//! into `(key, value)` pairs by the caller and turned into a
//! [`SessionConfig`] here.

use crate::transfer::TransferParams;

/// Which device to open and how to clock transfers on it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionConfig {
    /// Bus number
    pub bus: u32,
    /// Chip select (device) number on the bus
    pub device: u32,
    /// Parameters for every transfer
    pub params: TransferParams,
}

impl SessionConfig {
    /// Create a configuration for `bus`/`device` with default parameters
    pub fn new(bus: u32, device: u32) -> Self {
        Self {
            bus,
            device,
            ..Default::default()
        }
    }
}

/// Parse session options
///
/// Recognized keys:
///
/// - `bus=<n>` - bus number (default 0)
/// - `cs=<n>` or `dev=<n>` - chip select (default 0)
/// - `speed=<Hz>` - transfer clock speed
/// - `delay=<us>` - delay after each transfer
/// - `bits=<n>` - bits per word
///
/// Options that are not recognized are returned for the backend to handle.
pub fn parse_options<'a>(
    options: &[(&'a str, &'a str)],
) -> Result<(SessionConfig, Vec<(&'a str, &'a str)>), String> {
    let mut config = SessionConfig::default();
    let mut rest = Vec::new();

    for &(key, value) in options {
        match key {
            "bus" => {
                config.bus = value
                    .parse()
                    .map_err(|_| format!("Invalid bus value: {}", value))?;
            }
            "cs" | "dev" => {
                config.device = value
                    .parse()
                    .map_err(|_| format!("Invalid chip select value: {}", value))?;
            }
            "speed" => {
                let speed: u32 = value
                    .parse()
                    .map_err(|_| format!("Invalid speed value: {}", value))?;
                if speed == 0 {
                    return Err("Speed must be greater than 0".to_string());
                }
                config.params.speed_hz = speed;
            }
            "delay" => {
                config.params.delay_usecs = value
                    .parse()
                    .map_err(|_| format!("Invalid delay value: {}", value))?;
            }
            "bits" => {
                let bits: u8 = value
                    .parse()
                    .map_err(|_| format!("Invalid bits value: {}", value))?;
                if !(1..=32).contains(&bits) {
                    return Err(format!("Invalid bits per word: {} (must be 1-32)", bits));
                }
                config.params.bits_per_word = bits;
            }
            _ => rest.push((key, value)),
        }
    }

    Ok((config, rest))
}
