//! Updater layout file loading
//!
//! Layout files are TOML with any subset of the `UpdaterConfig` fields;
//! missing keys keep the shipping defaults. TOML integer literals may be
//! written in hex:
//!
//! ```toml
//! flash_window_limit = 0x20000
//! booster_offset = 0x5a000
//! reboot_image_index = 2
//! ```

use std::path::Path;

use booster_core::config::UpdaterConfig;

use crate::error::{read_file, Result};

/// Load and validate an updater layout, or the default one if no path is given
pub fn load_config(path: Option<&Path>) -> Result<UpdaterConfig> {
    let config = match path {
        Some(path) => {
            let text = read_file(path)?;
            let config = parse_config(&String::from_utf8_lossy(&text))?;
            log::info!("Loaded updater layout from {}", path.display());
            config
        }
        None => UpdaterConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

/// Parse a TOML layout
pub fn parse_config(text: &str) -> Result<UpdaterConfig> {
    Ok(toml::from_str(text)?)
}
