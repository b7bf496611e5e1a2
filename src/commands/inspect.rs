//! Inspect command implementation

use std::path::Path;

use booster_core::geometry::{FlashGeometry, RAM_CACHE_CAPACITY};
use booster_core::hash;
use booster_core::multiboot::{self, BootSlot};

use super::split_package;
use crate::error::{read_file, Result};

/// What the updater would make of a payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSummary {
    /// Declared image length
    pub image_length: u32,
    /// Published digest
    pub xxhash: u32,
    /// Digest seed
    pub seed: u32,
    /// Bytes covered by the digest
    pub hash_length: u32,
    /// Whether the digest matches the image
    pub hash_ok: bool,
    /// Boot target the header selects, if it is a bitstream
    pub slot: Option<BootSlot>,
    /// Erase sectors the image spans
    pub sectors: usize,
}

/// Check a payload the way the updater's validation stages would
pub fn summarize(payload: &[u8]) -> Result<PackageSummary> {
    let (record, image) = split_package(payload)?;
    let metadata = record.metadata();
    let hash_ok = hash::verify(image, &metadata).is_ok();
    let slot = multiboot::identify(image).ok();

    Ok(PackageSummary {
        image_length: record.image_length(),
        xxhash: metadata.xxhash,
        seed: metadata.seed,
        hash_length: metadata.hash_length,
        hash_ok,
        slot,
        sectors: FlashGeometry::FIXED.sectors_for(record.image_length() as usize),
    })
}

/// Run the inspect command
pub fn run_inspect(input: &Path) -> Result<()> {
    let payload = read_file(input)?;
    let summary = summarize(&payload)?;

    println!("Payload: {:?}", input);
    println!(
        "  Image length: {} bytes ({} sectors)",
        summary.image_length, summary.sectors
    );
    if summary.image_length as usize > RAM_CACHE_CAPACITY {
        println!(
            "  WARNING: image exceeds the {} byte RAM cache and will be rejected",
            RAM_CACHE_CAPACITY
        );
    }
    println!(
        "  XXH32: 0x{:08X} (seed 0x{:08X}, {} bytes) {}",
        summary.xxhash,
        summary.seed,
        summary.hash_length,
        if summary.hash_ok { "OK" } else { "MISMATCH" }
    );
    match summary.slot {
        Some(slot) => println!("  Multiboot header: boots {:?} image", slot),
        None => println!("  Multiboot header: missing or unrecognized"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::prepare::build_package;
    use crate::error::CliError;
    use booster_core::hash::MetadataRecord;

    fn bitstream(len: usize) -> Vec<u8> {
        let mut data = BootSlot::Default.header().to_vec();
        data.resize(len, 0x17);
        data
    }

    #[test]
    fn test_summary_of_prepared_package() {
        let payload = build_package(&bitstream(5000), 3, None).unwrap();
        let summary = summarize(&payload).unwrap();
        assert_eq!(summary.image_length, 5000);
        assert_eq!(summary.sectors, 2);
        assert!(summary.hash_ok);
        assert_eq!(summary.slot, Some(BootSlot::Default));
    }

    #[test]
    fn test_corrupted_image_reports_mismatch() {
        let mut payload = build_package(&bitstream(300), 0, None).unwrap();
        let last = payload.len() - 1;
        payload[last] ^= 0xFF;
        let summary = summarize(&payload).unwrap();
        assert!(!summary.hash_ok);
    }

    #[test]
    fn test_truncated_payload() {
        let payload = build_package(&bitstream(300), 0, None).unwrap();
        assert!(matches!(
            summarize(&payload[..MetadataRecord::SIZE - 1]),
            Err(CliError::TruncatedPackage)
        ));
        assert!(matches!(
            summarize(&payload[..payload.len() - 1]),
            Err(CliError::LengthMismatch {
                declared: 300,
                actual: 299
            })
        ));
    }
}
