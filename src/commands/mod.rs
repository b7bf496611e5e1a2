//! CLI command implementations
//!
//! - `prepare` turns a raw bitstream into an install payload
//! - `inspect` checks a payload the way the updater will
//! - `simulate` runs the updater against an emulated flash chip

mod inspect;
mod prepare;
mod simulate;

pub use inspect::run_inspect;
pub use prepare::run_prepare;
pub use simulate::{run_simulate, SimulateArgs};

use booster_core::hash::MetadataRecord;

use crate::error::{CliError, Result};

/// Split an install payload into its record and image bytes
///
/// The image slice holds exactly the declared number of bytes.
fn split_package(payload: &[u8]) -> Result<(MetadataRecord, &[u8])> {
    let (record, image) = MetadataRecord::parse(payload).ok_or(CliError::TruncatedPackage)?;
    let declared = record.image_length();
    let image = image
        .get(..declared as usize)
        .ok_or(CliError::LengthMismatch {
            declared,
            actual: image.len(),
        })?;
    Ok((record, image))
}
