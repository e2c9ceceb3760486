//! Transfer command implementation

use crate::programmers::SessionCommand;
use spixfer_core::{DeviceOpener, SessionConfig, SpiSession};

/// Clock bytes out and print what came back
pub struct Transfer {
    /// Values to transmit, range checked by the engine
    pub tx: Vec<i64>,
    /// Minimum number of bytes to receive
    pub min_rx: usize,
}

impl SessionCommand for Transfer {
    fn run<O: DeviceOpener>(
        &self,
        session: &mut SpiSession<O>,
        config: &SessionConfig,
    ) -> Result<(), Box<dyn std::error::Error>> {
        log::debug!(
            "Transferring {} bytes (min rx {}) at {} Hz",
            self.tx.len(),
            self.min_rx,
            config.params.speed_hz
        );

        let rx = session.transfer_with(&self.tx, self.min_rx, &config.params)?;
        println!("{}", format_bytes(&rx));
        Ok(())
    }
}

/// Format received bytes as space separated hex
pub fn format_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("0x{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
