//! Error types for booster-core
//!
//! Every error here is terminal for an update run: it is detected once,
//! surfaced through the status indicator and the readable [`ErrorCode`],
//! and followed by a halt. None of them is ever retried.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Staged image does not fit in the RAM cache (or the source window)
    InvalidImageSize,
    /// Digest over the staged source does not match the metadata
    HashMismatch,
    /// Flash identity read in direct mode differs from the mapped-mode one
    SpiMismatch,
    /// Image does not start with a recognized multiboot header
    MissingMultiboot,
}

impl Error {
    /// The numeric code published for this error
    pub const fn code(self) -> ErrorCode {
        match self {
            Self::InvalidImageSize => ErrorCode::InvalidImageSize,
            Self::HashMismatch => ErrorCode::HashMismatch,
            Self::SpiMismatch => ErrorCode::SpiMismatch,
            Self::MissingMultiboot => ErrorCode::MissingMultiboot,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidImageSize => write!(f, "staged image does not fit in the RAM cache"),
            Self::HashMismatch => write!(f, "image hash mismatch"),
            Self::SpiMismatch => write!(f, "SPI flash identity changed across mode switch"),
            Self::MissingMultiboot => write!(f, "image is missing the multiboot header"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Readable error code, as left behind for a debugger after a halt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum ErrorCode {
    /// No error has occurred
    #[default]
    None = 0,
    /// See [`Error::InvalidImageSize`]
    InvalidImageSize = 1,
    /// See [`Error::HashMismatch`]
    HashMismatch = 2,
    /// See [`Error::SpiMismatch`]
    SpiMismatch = 3,
    /// See [`Error::MissingMultiboot`]
    MissingMultiboot = 4,
}

impl ErrorCode {
    /// Raw value of the code
    pub const fn as_u32(self) -> u32 {
        self as u32
    }

    /// Convert back to the error this code stands for, if any
    pub const fn error(self) -> Option<Error> {
        match self {
            Self::None => None,
            Self::InvalidImageSize => Some(Error::InvalidImageSize),
            Self::HashMismatch => Some(Error::HashMismatch),
            Self::SpiMismatch => Some(Error::SpiMismatch),
            Self::MissingMultiboot => Some(Error::MissingMultiboot),
        }
    }
}

impl From<Error> for ErrorCode {
    fn from(err: Error) -> Self {
        err.code()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.error() {
            Some(err) => write!(f, "{} ({})", err, self.as_u32()),
            None => write!(f, "no error (0)"),
        }
    }
}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_match_published_values() {
        assert_eq!(ErrorCode::None.as_u32(), 0);
        assert_eq!(Error::InvalidImageSize.code().as_u32(), 1);
        assert_eq!(Error::HashMismatch.code().as_u32(), 2);
        assert_eq!(Error::SpiMismatch.code().as_u32(), 3);
        assert_eq!(Error::MissingMultiboot.code().as_u32(), 4);
    }

    #[test]
    fn test_code_round_trips_to_error() {
        for err in [
            Error::InvalidImageSize,
            Error::HashMismatch,
            Error::SpiMismatch,
            Error::MissingMultiboot,
        ] {
            assert_eq!(ErrorCode::from(err).error(), Some(err));
        }
        assert_eq!(ErrorCode::None.error(), None);
    }
}
