//! Recording status indicator and platform

use booster_core::device::{IndicatorMode, Platform, StatusIndicator};

/// Status indicator that records every mode change and tick
#[derive(Debug, Default)]
pub struct DummyIndicator {
    /// Modes in the order they were set
    pub modes: Vec<IndicatorMode>,
    /// Tick values in the order they were shown
    pub ticks: Vec<u8>,
}

impl DummyIndicator {
    /// Mode currently shown
    pub fn mode(&self) -> IndicatorMode {
        self.modes.last().copied().unwrap_or_default()
    }
}

impl StatusIndicator for DummyIndicator {
    fn set_mode(&mut self, mode: IndicatorMode) {
        log::debug!("Indicator: {:?}", mode);
        self.modes.push(mode);
    }

    fn tick(&mut self, value: u8) {
        self.ticks.push(value);
    }
}

/// Platform that records delays and reboot requests instead of acting
#[derive(Debug, Default)]
pub struct DummyPlatform {
    /// Requested delays in milliseconds
    pub delays: Vec<u32>,
    /// Requested reboot image indices
    pub reboots: Vec<u8>,
}

impl DummyPlatform {
    /// Total time spent in delays
    pub fn total_delay_ms(&self) -> u64 {
        self.delays.iter().map(|&ms| u64::from(ms)).sum()
    }
}

impl Platform for DummyPlatform {
    fn delay_ms(&mut self, ms: u32) {
        self.delays.push(ms);
    }

    fn reboot(&mut self, image_index: u8) {
        log::info!("Reboot requested into image {}", image_index);
        self.reboots.push(image_index);
    }
}
