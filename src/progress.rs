//! Status indicator rendered as a terminal progress bar

use std::time::Duration;

use booster_core::device::{IndicatorMode, StatusIndicator};
use indicatif::{ProgressBar, ProgressStyle};

/// Create a standard progress bar style
fn create_progress_bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} pages {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-")
}

/// Shows page ticks as a progress bar and indicator modes as messages
pub struct IndicatifIndicator {
    bar: ProgressBar,
    mode: IndicatorMode,
}

impl IndicatifIndicator {
    /// Create an indicator expecting at most `pages` page programs
    pub fn new(pages: u64) -> Self {
        let bar = ProgressBar::new(pages);
        bar.set_style(create_progress_bar_style());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self {
            bar,
            mode: IndicatorMode::Idle,
        }
    }

    /// Mode currently shown
    pub fn mode(&self) -> IndicatorMode {
        self.mode
    }

    /// Stop the bar, leaving its last state on screen
    pub fn finish(&self) {
        self.bar.finish();
    }
}

impl StatusIndicator for IndicatifIndicator {
    fn set_mode(&mut self, mode: IndicatorMode) {
        self.mode = mode;
        let message = match mode {
            IndicatorMode::Idle => "idle",
            IndicatorMode::Error => "ERROR",
            IndicatorMode::Writing => "committing",
        };
        self.bar.set_message(message);
    }

    fn tick(&mut self, _value: u8) {
        self.bar.inc(1);
    }
}
