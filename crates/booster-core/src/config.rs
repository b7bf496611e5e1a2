//! Updater configuration
//!
//! The defaults describe the shipping flash layout. The host tool can load
//! an alternative layout from TOML (see the `serde` feature) to rehearse
//! updates for other board revisions:
//!
//! ```toml
//! flash_window_limit = 0x20000
//! booster_offset = 0x5a000
//! settle_delay_ms = 1000
//! reboot_image_index = 2
//! ```

use core::fmt;

use crate::geometry::{
    FlashGeometry, BOOSTER_OFFSET, FLASH_WINDOW_LIMIT, REBOOT_IMAGE_INDEX,
    RECOVERY_IMAGE_OFFSET, SETTLE_DELAY_MS,
};

/// Runtime layout and timing parameters of an update run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct UpdaterConfig {
    /// End (exclusive) of the rewritten flash window
    pub flash_window_limit: u32,
    /// Sector holding the updater itself, erased at commit time
    pub booster_offset: u32,
    /// Recovery image location, which must stay untouched
    pub recovery_offset: u32,
    /// Settle delay before the commit sequence, in milliseconds
    pub settle_delay_ms: u32,
    /// Image index passed to the reboot controller
    pub reboot_image_index: u8,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            flash_window_limit: FLASH_WINDOW_LIMIT,
            booster_offset: BOOSTER_OFFSET,
            recovery_offset: RECOVERY_IMAGE_OFFSET,
            settle_delay_ms: SETTLE_DELAY_MS,
            reboot_image_index: REBOOT_IMAGE_INDEX,
        }
    }
}

/// Reasons a configuration is refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// An offset or limit is not on an erase sector boundary
    Unaligned {
        /// The offending value
        value: u32,
    },
    /// The updater's own sector lies inside the rewritten window
    BoosterInsideWindow,
    /// The window or the updater sector overlaps the recovery image sector
    RecoveryOverlap,
    /// The reboot controller only encodes image indices 0 to 3
    InvalidImageIndex(u8),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unaligned { value } => {
                write!(f, "0x{:08X} is not aligned to an erase sector", value)
            }
            Self::BoosterInsideWindow => write!(f, "updater sector lies inside the flash window"),
            Self::RecoveryOverlap => write!(f, "layout overlaps the recovery image"),
            Self::InvalidImageIndex(idx) => write!(f, "reboot image index {} out of range", idx),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

impl UpdaterConfig {
    /// Check the layout against the fixed flash geometry
    pub fn validate(&self) -> Result<(), ConfigError> {
        let geo = FlashGeometry::FIXED;

        for value in [self.flash_window_limit, self.booster_offset, self.recovery_offset] {
            if !geo.is_sector_aligned(value) {
                return Err(ConfigError::Unaligned { value });
            }
        }

        if self.booster_offset < self.flash_window_limit {
            return Err(ConfigError::BoosterInsideWindow);
        }

        if self.recovery_offset < self.flash_window_limit
            || self.recovery_offset == self.booster_offset
        {
            return Err(ConfigError::RecoveryOverlap);
        }

        if self.reboot_image_index > 3 {
            return Err(ConfigError::InvalidImageIndex(self.reboot_image_index));
        }

        Ok(())
    }
}
