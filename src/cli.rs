//! CLI argument parsing

use clap::{Parser, Subcommand, ValueEnum};

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

#[derive(Parser)]
#[command(name = "cyprog")]
#[command(author, version, about = "Cypress PSoC programmer", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// USB serial number of the KitProg to use
    /// (defaults to the first adapter found)
    #[arg(long, global = true)]
    pub serial: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show adapter firmware version and measured target voltage
    Info,

    /// Pulse the target reset line
    ResetTarget,

    /// Probe the target and print the flash bank geometry
    Probe {
        /// Bank size in bytes, overriding the probed value (hex or decimal)
        #[arg(long, value_parser = parse_hex_u32)]
        size: Option<u32>,
    },

    /// Erase the entire flash device
    MassErase {
        /// Bank size in bytes, overriding the probed value (hex or decimal)
        #[arg(long, value_parser = parse_hex_u32)]
        size: Option<u32>,

        /// Set autoerase mode before erasing
        #[arg(long, value_enum)]
        autoerase: Option<Switch>,
    },
}

/// on/off toggle for mode switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

impl From<Switch> for bool {
    fn from(s: Switch) -> bool {
        s == Switch::On
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_accepts_hex_and_decimal() {
        assert_eq!(parse_hex_u32("0x40000"), Ok(0x40000));
        assert_eq!(parse_hex_u32("262144"), Ok(262144));
        assert!(parse_hex_u32("0xnope").is_err());
    }

    #[test]
    fn command_line_parses() {
        let cli = Cli::try_parse_from(["cyprog", "-vv", "probe", "--size", "0x10000"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Probe { size } => assert_eq!(size, Some(0x10000)),
            _ => panic!("wrong subcommand"),
        }

        let cli = Cli::try_parse_from([
            "cyprog",
            "--serial",
            "0B0B0B0B",
            "mass-erase",
            "--autoerase",
            "on",
        ])
        .unwrap();
        assert_eq!(cli.serial.as_deref(), Some("0B0B0B0B"));
        match cli.command {
            Commands::MassErase { autoerase, .. } => assert_eq!(autoerase, Some(Switch::On)),
            _ => panic!("wrong subcommand"),
        }
    }
}
