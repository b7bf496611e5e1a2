//! Host tool error type

use std::path::PathBuf;

use booster_core::config::ConfigError;

/// Errors surfaced by the booster commands
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// File could not be read or written
    #[error("{path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Updater config file is not valid TOML for `UpdaterConfig`
    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    /// Updater config describes an impossible layout
    #[error("invalid updater layout: {0}")]
    Layout(#[from] ConfigError),

    /// The update itself failed
    #[error("update halted: {0}")]
    Update(#[from] booster_core::Error),

    /// Payload is shorter than its metadata record
    #[error("payload is too short to hold a metadata record")]
    TruncatedPackage,

    /// Payload declares more image bytes than it carries
    #[error("payload declares {declared} image bytes but carries {actual}")]
    LengthMismatch {
        /// Length in the metadata record
        declared: u32,
        /// Bytes actually present
        actual: usize,
    },

    /// Digest range exceeds the image
    #[error("hash length {hash_length} exceeds image length {image_length}")]
    HashRange {
        /// Requested digest range
        hash_length: u32,
        /// Image length
        image_length: usize,
    },
}

/// Result alias for the host tool
pub type Result<T> = std::result::Result<T, CliError>;

/// Read a whole file, tagging errors with its path
pub fn read_file(path: &std::path::Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a whole file, tagging errors with its path
pub fn write_file(path: &std::path::Path, data: &[u8]) -> Result<()> {
    std::fs::write(path, data).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}
