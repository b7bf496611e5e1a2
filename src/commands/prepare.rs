//! Prepare command implementation

use std::path::Path;

use booster_core::geometry::RAM_CACHE_CAPACITY;
use booster_core::hash::{self, ImageMetadata, MetadataRecord};
use booster_core::multiboot;

use crate::error::{read_file, write_file, CliError, Result};

/// Build the install payload for a raw bitstream
pub fn build_package(image: &[u8], seed: u32, hash_length: Option<u32>) -> Result<Vec<u8>> {
    if image.len() > RAM_CACHE_CAPACITY {
        return Err(booster_core::Error::InvalidImageSize.into());
    }
    let slot = multiboot::identify(image)?;
    log::debug!("Bitstream boots {:?}", slot);

    let hash_length = hash_length.unwrap_or(image.len() as u32);
    let xxhash = hash::compute(image, hash_length, seed).map_err(|_| CliError::HashRange {
        hash_length,
        image_length: image.len(),
    })?;

    let metadata = ImageMetadata {
        xxhash,
        seed,
        hash_length,
    };
    let record = MetadataRecord::new(image.len() as u32, &metadata);

    let mut payload = Vec::with_capacity(MetadataRecord::SIZE + image.len());
    payload.extend_from_slice(record.as_slice());
    payload.extend_from_slice(image);
    Ok(payload)
}

/// Run the prepare command
pub fn run_prepare(
    input: &Path,
    output: &Path,
    seed: u32,
    hash_length: Option<u32>,
) -> Result<()> {
    let image = read_file(input)?;
    println!("Read {} bytes from {:?}", image.len(), input);

    let payload = build_package(&image, seed, hash_length)?;
    write_file(output, &payload)?;

    let (record, _) = MetadataRecord::parse(&payload).ok_or(CliError::TruncatedPackage)?;
    let metadata = record.metadata();
    println!(
        "Wrote {} bytes to {:?} (xxh32 0x{:08X}, seed 0x{:08X}, {} bytes hashed)",
        payload.len(),
        output,
        metadata.xxhash,
        metadata.seed,
        metadata.hash_length
    );
    Ok(())
}
