//! Info command implementation

use crate::programmers::SessionCommand;
use spixfer_core::{DeviceOpener, SessionConfig, SpiModeFlags, SpiSession};

/// Show the settings read back from the device
pub struct Info;

impl SessionCommand for Info {
    fn run<O: DeviceOpener>(
        &self,
        session: &mut SpiSession<O>,
        config: &SessionConfig,
    ) -> Result<(), Box<dyn std::error::Error>> {
        println!("Device:          {}", session.path().unwrap_or("-"));
        println!("Mode:            {}", format_mode(session.mode_flags()));
        println!("Bits per word:   {}", session.bits_per_word());
        println!("Max speed:       {} Hz", session.max_speed_hz());
        println!(
            "Transfer params: {} Hz, {} us delay, {} bits per word",
            config.params.speed_hz, config.params.delay_usecs, config.params.bits_per_word
        );
        Ok(())
    }
}

/// Describe a mode byte, e.g. `0x05 (mode 1, CS_HIGH)`
pub fn format_mode(flags: SpiModeFlags) -> String {
    let mut out = format!("{:#04x} (mode {}", flags.bits(), flags.clock_mode());
    for (name, _) in (flags - SpiModeFlags::CPOL - SpiModeFlags::CPHA).iter_names() {
        out.push_str(", ");
        out.push_str(name);
    }
    out.push(')');
    out
}
