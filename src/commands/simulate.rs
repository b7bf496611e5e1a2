//! Simulate command implementation
//!
//! Runs the real update state machine against the emulated flash so a
//! payload can be rehearsed before it is sent to a device.

use std::path::{Path, PathBuf};

use booster_core::cache::RamImageCache;
use booster_core::config::UpdaterConfig;
use booster_core::geometry::FlashGeometry;
use booster_core::update::{UpdateReport, UpdateStateMachine};
use booster_dummy::{DummyConfig, DummyFlash, DummyPlatform, DummyUpload};

use super::split_package;
use crate::config::load_config;
use crate::error::{read_file, write_file, CliError, Result};
use crate::progress::IndicatifIndicator;

/// Arguments of the simulate command
#[derive(Debug, Clone)]
pub struct SimulateArgs {
    /// Install payload
    pub package: PathBuf,
    /// Flash contents before the update
    pub flash: PathBuf,
    /// Where to store the flash contents afterwards
    pub output: Option<PathBuf>,
    /// Updater layout file
    pub config: Option<PathBuf>,
    /// Identity reported by the chip
    pub spi_id: u32,
    /// Identity published while memory-mapped
    pub mapped_spi_id: Option<u32>,
    /// Emulated flash size
    pub flash_size: u32,
}

/// Outcome of a simulated update
#[derive(Debug)]
pub struct Simulation {
    /// Flash after the run
    pub flash: DummyFlash,
    /// Platform calls made during the run
    pub platform: DummyPlatform,
    /// Report, or the error the run halted with
    pub result: std::result::Result<UpdateReport, booster_core::Error>,
}

/// Run one update of `payload` over `initial_flash`
pub fn simulate(
    config: UpdaterConfig,
    payload: &[u8],
    initial_flash: &[u8],
    flash_config: DummyConfig,
    mapped_spi_id: u32,
    indicator: &mut IndicatifIndicator,
) -> Result<Simulation> {
    // Reject malformed payloads up front; the updater only sees the window.
    split_package(payload)?;
    let upload =
        DummyUpload::from_package(payload, mapped_spi_id).ok_or(CliError::TruncatedPackage)?;

    let mut flash = DummyFlash::with_data(flash_config, initial_flash);
    let mut platform = DummyPlatform::default();
    let mut cache = Box::new(RamImageCache::new());

    let result = UpdateStateMachine::new(
        config,
        &upload,
        &mut flash,
        indicator,
        &mut platform,
        &mut cache,
    )
    .run();

    for violation in flash.violations() {
        log::warn!("Flash protocol violation: {:?}", violation);
    }

    Ok(Simulation {
        flash,
        platform,
        result,
    })
}

/// Run the simulate command
pub fn run_simulate(args: &SimulateArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let payload = read_file(&args.package)?;
    let initial = read_file(&args.flash)?;
    if initial.len() > args.flash_size as usize {
        log::warn!(
            "Flash image is {} bytes, truncating to {}",
            initial.len(),
            args.flash_size
        );
    }

    let flash_config = DummyConfig {
        spi_id: args.spi_id,
        size: args.flash_size as usize,
        ..Default::default()
    };
    let geometry = FlashGeometry::FIXED;
    let pages = (config.flash_window_limit as usize / geometry.program_page_size) as u64;
    let mut indicator = IndicatifIndicator::new(pages);

    let simulation = simulate(
        config,
        &payload,
        &initial,
        flash_config,
        args.mapped_spi_id.unwrap_or(args.spi_id),
        &mut indicator,
    )?;
    indicator.finish();

    report(&simulation);
    if let Some(output) = &args.output {
        write_flash(output, &simulation.flash)?;
    }

    simulation.result.map(|_| ()).map_err(CliError::from)
}

fn report(simulation: &Simulation) {
    match &simulation.result {
        Ok(report) => {
            println!("Update completed, device rebooted");
            println!("  Image length: {} bytes", report.image_length);
            println!("  XXH32: 0x{:08X}", report.hash);
            println!("  Flash ID: 0x{:08X}", report.spi_id);
            if let Some(slot) = report.previous_slot {
                println!("  Header redirected from {:?} image", slot);
            }
            let stats = &report.stats;
            println!(
                "  Sectors: {} checked, {} skipped, {} erased",
                stats.sectors_checked, stats.sectors_skipped, stats.sectors_erased
            );
            println!(
                "  Programmed {} pages ({} bytes)",
                stats.pages_programmed, stats.bytes_programmed
            );
        }
        Err(err) => {
            println!(
                "Update halted with error code {}: {}",
                err.code().as_u32(),
                err
            );
            println!("  Device would stay in the error state until recovered externally");
        }
    }
    println!(
        "  Platform: {} ms of delays, reboots {:?}",
        simulation.platform.total_delay_ms(),
        simulation.platform.reboots
    );
}

fn write_flash(path: &Path, flash: &DummyFlash) -> Result<()> {
    write_file(path, flash.data())?;
    println!("Wrote flash contents to {:?}", path);
    Ok(())
}
