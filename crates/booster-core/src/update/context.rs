//! Update context - state threaded through the update stages

use bitflags::bitflags;

use crate::error::{Error, ErrorCode};
use crate::flash::RewriteStats;
use crate::multiboot::BootSlot;

bitflags! {
    /// Validation gates passed so far
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Gates: u8 {
        /// Image fits the RAM cache and the staging window
        const SIZE     = 1 << 0;
        /// Digest over the staged source matches the metadata
        const HASH     = 1 << 1;
        /// Cached image starts with a multiboot header
        const HEADER   = 1 << 2;
        /// Flash identity survived the switch to direct access
        const IDENTITY = 1 << 3;
    }
}

/// Stage of an update run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    /// Busy-polling for the host to finish staging an image
    #[default]
    WaitForTrigger,
    /// Checking the declared image length
    ValidateSize,
    /// Hashing the staged source
    ValidateHash,
    /// Copying the image into the RAM cache
    CopyToRam,
    /// Checking the multiboot header of the cached image
    ValidateHeader,
    /// Redirecting the cached image's boot target to the updater
    PatchHeader,
    /// Leaving memory-mapped mode
    SwitchToDirectMode,
    /// Comparing flash identities across the mode switch
    VerifyIdentity,
    /// Rewriting the sectors that differ
    DifferentialRewrite,
    /// Reverting the boot target, erasing the updater, rebooting
    Finalize,
    /// Reboot requested; the run is over
    Rebooted,
    /// A validation gate failed; the device halts
    Error(Error),
}

impl Stage {
    /// Whether no further stage follows
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rebooted | Self::Error(_))
    }
}

/// Mutable state of one update run
#[derive(Debug, Clone, Default)]
pub struct UpdateContext {
    /// Current stage
    pub stage: Stage,
    /// Readable error code, set at most once
    pub error_code: ErrorCode,
    /// Validation gates passed
    pub gates: Gates,
    /// Image length captured before the copy
    pub image_length: u32,
    /// Digest computed over the staged source
    pub calculated_hash: Option<u32>,
    /// Flash identity recorded while memory-mapped
    pub cached_spi_id: Option<u32>,
    /// Flash identity read over direct access
    pub read_spi_id: Option<u32>,
    /// Boot slot the image selected before patching
    pub previous_slot: Option<BootSlot>,
    /// Outcome of the differential rewrite
    pub stats: Option<RewriteStats>,
}

impl UpdateContext {
    /// Fresh context waiting for an upload
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a terminal error. Later errors do not overwrite the first.
    pub(crate) fn record_error(&mut self, err: Error) -> Error {
        if self.error_code == ErrorCode::None {
            self.error_code = err.code();
        }
        err
    }

    /// Summary of a completed run
    pub fn report(&self) -> UpdateReport {
        UpdateReport {
            image_length: self.image_length,
            hash: self.calculated_hash.unwrap_or_default(),
            spi_id: self.read_spi_id.unwrap_or_default(),
            previous_slot: self.previous_slot,
            stats: self.stats.unwrap_or_default(),
        }
    }
}

/// Summary of a successful update run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateReport {
    /// Bytes of image flashed (before the window limit)
    pub image_length: u32,
    /// Verified digest of the staged image
    pub hash: u32,
    /// Flash identity
    pub spi_id: u32,
    /// Boot slot the image selected before patching
    pub previous_slot: Option<BootSlot>,
    /// Differential rewrite statistics
    pub stats: RewriteStats,
}
