//! spixfer - Full-duplex SPI transfers from the command line
//!
//! Opens one bus/device pair through a programmer backend, performs a single
//! duplex transfer (or reports the device settings) and closes it again.
//!
//! ```bash
//! # Send a JEDEC ID command and read three response bytes
//! spixfer transfer -p linux_spi:bus=0,cs=0 --min-rx 4 0x9F
//!
//! # Show mode, bits per word and max speed of /dev/spidev1.0
//! spixfer info -p linux_spi:bus=1
//! ```

mod cli;
mod commands;
mod programmers;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logger, -v/-vv override RUST_LOG
    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    match cli.verbose {
        0 => {} // default (info)
        1 => {
            logger.filter_level(log::LevelFilter::Debug);
        }
        _ => {
            logger.filter_level(log::LevelFilter::Trace);
        }
    }
    logger.init();

    match cli.command {
        Commands::Transfer {
            programmer,
            min_rx,
            bytes,
        } => programmers::with_session(
            &programmer,
            &commands::Transfer {
                tx: bytes,
                min_rx,
            },
        ),
        Commands::Info { programmer } => programmers::with_session(&programmer, &commands::Info),
        Commands::ListProgrammers => {
            commands::list_programmers();
            Ok(())
        }
    }
}
