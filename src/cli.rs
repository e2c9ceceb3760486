//! CLI argument parsing

use clap::{Parser, Subcommand};

/// Parse a transmit value as a signed decimal or `0x` hex integer
///
/// Range checking is left to the transfer engine so that out-of-range input
/// is reported with its position.
pub fn parse_byte_value(s: &str) -> Result<i64, String> {
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };

    let magnitude = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        i64::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))?
    } else {
        digits
            .parse::<i64>()
            .map_err(|e| format!("Invalid number: {}", e))?
    };

    Ok(if negative { -magnitude } else { magnitude })
}

#[derive(Parser)]
#[command(name = "spixfer")]
#[command(author, version, about = "Full-duplex SPI transfers over spidev", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Clock bytes out and print the bytes clocked in
    Transfer {
        /// Programmer to use, e.g. linux_spi:bus=0,cs=1,speed=500000
        #[arg(short, long)]
        programmer: String,

        /// Receive at least this many bytes (transmit is padded with zeros)
        #[arg(short = 'r', long, default_value_t = 0)]
        min_rx: usize,

        /// Bytes to transmit (decimal or 0x hex)
        #[arg(value_parser = parse_byte_value, allow_negative_numbers = true)]
        bytes: Vec<i64>,
    },

    /// Open a device and show its current settings
    Info {
        /// Programmer to use
        #[arg(short, long)]
        programmer: String,
    },

    /// List available programmers
    ListProgrammers,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_byte_value() {
        assert_eq!(parse_byte_value("0"), Ok(0));
        assert_eq!(parse_byte_value("255"), Ok(255));
        assert_eq!(parse_byte_value("0x9F"), Ok(0x9F));
        assert_eq!(parse_byte_value("0Xff"), Ok(0xFF));
        assert_eq!(parse_byte_value("256"), Ok(256));
        assert_eq!(parse_byte_value("-1"), Ok(-1));
        assert_eq!(parse_byte_value("-0x10"), Ok(-16));
        assert!(parse_byte_value("zz").is_err());
        assert!(parse_byte_value("0x").is_err());
    }

    #[test]
    fn test_cli_transfer_args() {
        let cli = Cli::try_parse_from([
            "spixfer",
            "-v",
            "transfer",
            "-p",
            "dummy",
            "--min-rx",
            "4",
            "0x9F",
            "-1",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Transfer {
                programmer,
                min_rx,
                bytes,
            } => {
                assert_eq!(programmer, "dummy");
                assert_eq!(min_rx, 4);
                assert_eq!(bytes, vec![0x9F, -1]);
            }
            _ => panic!("expected transfer command"),
        }
    }

    #[test]
    fn test_cli_verify() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
