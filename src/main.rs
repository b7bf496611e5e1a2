//! booster - Host tools for the fail-safe FPGA bitstream self-updater
//!
//! The updater itself runs on the device from RAM and lives in
//! `booster-core`. This binary covers the host side of an update:
//! packaging a bitstream with the metadata the updater checks, inspecting
//! a package, and rehearsing the whole update against an emulated flash.

mod cli;
mod commands;
mod config;
mod error;
mod progress;

use clap::Parser;
use cli::{Cli, Commands};
use commands::SimulateArgs;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    let result = match cli.command {
        Commands::Prepare {
            input,
            output,
            seed,
            hash_length,
        } => commands::run_prepare(&input, &output, seed, hash_length),
        Commands::Inspect { input } => commands::run_inspect(&input),
        Commands::Simulate {
            package,
            flash,
            output,
            config,
            spi_id,
            mapped_spi_id,
            flash_size,
        } => commands::run_simulate(&SimulateArgs {
            package,
            flash,
            output,
            config,
            spi_id,
            mapped_spi_id,
            flash_size,
        }),
    };

    Ok(result?)
}
