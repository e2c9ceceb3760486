//! Programmer registration and dispatch
//!
//! A programmer string selects a backend and configures the session opened
//! on it: `name` or `name:key=value,...`.

use spixfer_core::{parse_options, DeviceOpener, SessionConfig, SpiError, SpiSession};
use thiserror::Error;

/// Information about a programmer
pub struct ProgrammerInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// Errors from selecting or opening a programmer
#[derive(Debug, Error)]
pub enum ProgrammerError {
    /// Name does not match any compiled-in programmer
    #[error("Unknown programmer: {name}\n\n{help}\nUse 'spixfer list-programmers' for more details")]
    Unknown { name: String, help: String },

    /// Options could not be parsed
    #[error("Invalid {programmer} parameters: {message}")]
    InvalidOptions {
        programmer: &'static str,
        message: String,
    },

    /// Session could not be opened
    #[error("Failed to open {programmer} device: {source}{hint}")]
    OpenFailed {
        programmer: &'static str,
        #[source]
        source: SpiError,
        hint: &'static str,
    },
}

/// Something to run against an open session
pub trait SessionCommand {
    /// Run with the session and the configuration it was opened with
    fn run<O: DeviceOpener>(
        &self,
        session: &mut SpiSession<O>,
        config: &SessionConfig,
    ) -> Result<(), Box<dyn std::error::Error>>;
}

/// Get information about all available programmers (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_programmers() -> Vec<ProgrammerInfo> {
    let mut programmers = Vec::new();

    #[cfg(feature = "dummy")]
    programmers.push(ProgrammerInfo {
        name: "dummy",
        aliases: &[],
        description: "In-memory loopback device for testing (fill=<byte>)",
    });

    #[cfg(feature = "linux-spi")]
    programmers.push(ProgrammerInfo {
        name: "linux_spi",
        aliases: &["linux-spi", "spidev"],
        description: "Linux spidev interface (bus=<n>,cs=<n>)",
    });

    programmers
}

/// Generate help text listing all available programmers
pub fn programmer_help() -> String {
    let programmers = available_programmers();

    if programmers.is_empty() {
        return "No programmers available (recompile with programmer features enabled)".to_string();
    }

    let mut help = String::from("Available programmers:\n");
    for p in &programmers {
        help.push_str(&format!("  {:12} - {}\n", p.name, p.description));
    }
    help
}

/// Resolve a programmer name or alias to its primary name
pub fn find_programmer(name: &str) -> Option<&'static str> {
    available_programmers()
        .into_iter()
        .find(|p| p.name == name || p.aliases.contains(&name))
        .map(|p| p.name)
}

/// Open a session on the specified programmer and run `command` on it
///
/// Session options (`bus`, `cs`, `speed`, `delay`, `bits`) apply to every
/// programmer. The session is closed afterwards and a close failure is
/// reported.
pub fn with_session<C: SessionCommand>(
    programmer: &str,
    command: &C,
) -> Result<(), Box<dyn std::error::Error>> {
    let (name, options) = parse_programmer_string(programmer);

    let canonical_name = find_programmer(name).ok_or_else(|| unknown_programmer_error(name))?;

    let (config, rest) =
        parse_options(&options).map_err(|message| ProgrammerError::InvalidOptions {
            programmer: canonical_name,
            message,
        })?;

    match canonical_name {
        #[cfg(feature = "dummy")]
        "dummy" => {
            let dummy = spixfer_dummy::parse_options(&rest).map_err(|message| {
                ProgrammerError::InvalidOptions {
                    programmer: "dummy",
                    message,
                }
            })?;
            let bus = spixfer_dummy::DummyBus::new(dummy);
            let session = SpiSession::open_new(bus, config.bus, config.device).map_err(|e| {
                ProgrammerError::OpenFailed {
                    programmer: "dummy",
                    source: e,
                    hint: "",
                }
            })?;
            run_and_close(session, &config, command)
        }

        #[cfg(feature = "linux-spi")]
        "linux_spi" => {
            for (key, value) in &rest {
                log::warn!("linux_spi: Unknown option: {}={}", key, value);
            }

            log::info!("Opening Linux SPI programmer...");

            let opener = spixfer_linux::SpidevOpener::default();
            let session = SpiSession::open_new(opener, config.bus, config.device).map_err(|e| {
                ProgrammerError::OpenFailed {
                    programmer: "linux_spi",
                    source: e,
                    hint: "\nMake sure the device exists and you have read/write permissions.\n\
                           You may need to: sudo usermod -aG spi $USER",
                }
            })?;
            run_and_close(session, &config, command)
        }

        _ => Err(unknown_programmer_error(name).into()),
    }
}

#[cfg(any(feature = "dummy", feature = "linux-spi"))]
fn run_and_close<O: DeviceOpener, C: SessionCommand>(
    mut session: SpiSession<O>,
    config: &SessionConfig,
    command: &C,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = command.run(&mut session, config);
    let closed = session.close();
    result?;
    closed?;
    Ok(())
}

/// Parse a programmer string into name and options
///
/// Format: "name" or "name:option1=value1,option2=value2"
pub fn parse_programmer_string(s: &str) -> (&str, Vec<(&str, &str)>) {
    if let Some((name, opts)) = s.split_once(':') {
        let options: Vec<_> = opts
            .split(',')
            .filter_map(|opt| opt.split_once('='))
            .collect();
        (name, options)
    } else {
        (s, Vec::new())
    }
}

fn unknown_programmer_error(name: &str) -> ProgrammerError {
    ProgrammerError::Unknown {
        name: name.to_string(),
        help: programmer_help(),
    }
}
