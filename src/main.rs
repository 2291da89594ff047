//! cyprog - a programmer for Cypress PSoC devices
//!
//! Talks to the target through the KitProg debug adapter found on PSoC
//! development kits: SWD transactions go over the adapter's vendor bulk
//! interface, housekeeping over its HID interface. Flash itself is
//! driven through the PSoC 5LP System Performance Controller.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    let serial = cli.serial.as_deref();

    match cli.command {
        Commands::Info => commands::info::run(serial),
        Commands::ResetTarget => commands::reset::run(serial),
        Commands::Probe { size } => commands::probe::run(serial, size),
        Commands::MassErase { size, autoerase } => {
            commands::mass_erase::run(serial, size, autoerase.map(bool::from))
        }
    }
}
