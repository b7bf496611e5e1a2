//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

#[derive(Parser)]
#[command(name = "booster")]
#[command(author, version, about = "Fail-safe FPGA bitstream self-updater tools", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Package a raw bitstream into an install payload
    Prepare {
        /// Raw bitstream (must start with a multiboot header)
        #[arg(short, long)]
        input: PathBuf,

        /// Output install payload
        #[arg(short, long)]
        output: PathBuf,

        /// XXH32 seed
        #[arg(long, default_value = "0", value_parser = parse_hex_u32)]
        seed: u32,

        /// Number of leading bytes covered by the digest (default: whole image)
        #[arg(long, value_parser = parse_hex_u32)]
        hash_length: Option<u32>,
    },

    /// Show the contents of an install payload
    Inspect {
        /// Install payload
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Rehearse an update against a flash image
    Simulate {
        /// Install payload to stage
        #[arg(short, long)]
        package: PathBuf,

        /// Current flash contents (missing bytes read as erased)
        #[arg(short, long)]
        flash: PathBuf,

        /// Where to write the flash contents after the update
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Updater layout (TOML); defaults to the shipping layout
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Identity the flash chip reports
        #[arg(long, default_value = "0x00C22016", value_parser = parse_hex_u32)]
        spi_id: u32,

        /// Identity published while memory-mapped (default: same as --spi-id)
        #[arg(long, value_parser = parse_hex_u32)]
        mapped_spi_id: Option<u32>,

        /// Emulated flash size in bytes
        #[arg(long, default_value = "0x200000", value_parser = parse_hex_u32)]
        flash_size: u32,
    },
}
