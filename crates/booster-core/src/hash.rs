//! Image integrity check
//!
//! The uploader publishes a seeded XXH32 digest over the first
//! `hash_length` bytes of the staged image. The check guards against
//! corrupted or truncated uploads, not against tampering.
//!
//! The same metadata travels in install payloads as a 16-byte
//! little-endian [`MetadataRecord`] placed in front of the image.

use xxhash_rust::xxh32::Xxh32;
use zerocopy::byteorder::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::error::{Error, Result};

/// Bytes fed to the hasher per update call
const HASH_CHUNK_SIZE: usize = 4096;

/// Expected digest and how to compute it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageMetadata {
    /// Expected XXH32 digest
    pub xxhash: u32,
    /// XXH32 seed
    pub seed: u32,
    /// Number of leading image bytes covered by the digest
    pub hash_length: u32,
}

/// On-wire metadata record of an install payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct MetadataRecord {
    /// Length of the image that follows the record
    pub image_length: U32,
    /// Number of leading image bytes covered by the digest
    pub hash_length: U32,
    /// XXH32 seed
    pub seed: U32,
    /// Expected XXH32 digest
    pub xxhash: U32,
}

impl MetadataRecord {
    /// Size of the record in bytes
    pub const SIZE: usize = core::mem::size_of::<Self>();

    /// Build a record for an image of `image_length` bytes
    pub fn new(image_length: u32, metadata: &ImageMetadata) -> Self {
        Self {
            image_length: U32::new(image_length),
            hash_length: U32::new(metadata.hash_length),
            seed: U32::new(metadata.seed),
            xxhash: U32::new(metadata.xxhash),
        }
    }

    /// Split a payload into its record and the bytes after it
    ///
    /// Returns `None` if the payload is shorter than a record.
    pub fn parse(payload: &[u8]) -> Option<(Self, &[u8])> {
        Self::read_from_prefix(payload).ok()
    }

    /// The record as it appears on the wire
    pub fn as_slice(&self) -> &[u8] {
        self.as_bytes()
    }

    /// Declared image length
    pub fn image_length(&self) -> u32 {
        self.image_length.get()
    }

    /// Digest metadata carried by the record
    pub fn metadata(&self) -> ImageMetadata {
        ImageMetadata {
            xxhash: self.xxhash.get(),
            seed: self.seed.get(),
            hash_length: self.hash_length.get(),
        }
    }
}

/// Compute the seeded XXH32 digest of the first `hash_length` bytes
///
/// Fails with `HashMismatch` if the range runs past the end of `source`:
/// a digest over bytes that were never staged cannot be trusted.
pub fn compute(source: &[u8], hash_length: u32, seed: u32) -> Result<u32> {
    let region = source
        .get(..hash_length as usize)
        .ok_or(Error::HashMismatch)?;

    let mut hasher = Xxh32::new(seed);
    for chunk in region.chunks(HASH_CHUNK_SIZE) {
        hasher.update(chunk);
    }
    Ok(hasher.digest())
}

/// Check the staged source against its metadata
///
/// Returns the computed digest on success.
pub fn verify(source: &[u8], metadata: &ImageMetadata) -> Result<u32> {
    let digest = compute(source, metadata.hash_length, metadata.seed)?;
    if digest != metadata.xxhash {
        log::error!(
            "Hash mismatch: computed 0x{:08X}, expected 0x{:08X} over {} bytes",
            digest,
            metadata.xxhash,
            metadata.hash_length
        );
        return Err(Error::HashMismatch);
    }
    log::debug!(
        "Hash 0x{:08X} verified over {} bytes",
        digest,
        metadata.hash_length
    );
    Ok(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;
    use xxhash_rust::xxh32::xxh32;

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 + 3) as u8).collect()
    }

    #[test]
    fn test_empty_digest() {
        assert_eq!(compute(&[], 0, 0), Ok(0x02CC_5D05));
    }

    #[test]
    fn test_streaming_matches_one_shot() {
        let data = pattern(3 * HASH_CHUNK_SIZE + 123);
        let digest = compute(&data, data.len() as u32, 0x1234_5678).unwrap();
        assert_eq!(digest, xxh32(&data, 0x1234_5678));
    }

    #[test]
    fn test_hash_length_limits_range() {
        let mut data = pattern(1000);
        let digest = compute(&data, 500, 7).unwrap();
        // Bytes past hash_length do not contribute
        data[700] ^= 0xFF;
        assert_eq!(compute(&data, 500, 7), Ok(digest));
    }

    #[test]
    fn test_seed_changes_digest() {
        let data = pattern(64);
        assert_ne!(compute(&data, 64, 0), compute(&data, 64, 1));
    }

    #[test]
    fn test_range_past_source_rejected() {
        let data = pattern(16);
        assert_eq!(compute(&data, 17, 0), Err(Error::HashMismatch));
    }

    #[test]
    fn test_verify() {
        let data = pattern(256);
        let metadata = ImageMetadata {
            xxhash: xxh32(&data, 42),
            seed: 42,
            hash_length: 256,
        };
        assert_eq!(verify(&data, &metadata), Ok(metadata.xxhash));

        let corrupt = ImageMetadata {
            xxhash: metadata.xxhash ^ 1,
            ..metadata
        };
        assert_eq!(verify(&data, &corrupt), Err(Error::HashMismatch));
    }

    #[test]
    fn test_record_layout() {
        let metadata = ImageMetadata {
            xxhash: 0xDDCC_BBAA,
            seed: 0x0403_0201,
            hash_length: 0x100,
        };
        let record = MetadataRecord::new(0x200, &metadata);
        assert_eq!(MetadataRecord::SIZE, 16);
        assert_eq!(
            record.as_slice(),
            &[
                0x00, 0x02, 0x00, 0x00, // image_length
                0x00, 0x01, 0x00, 0x00, // hash_length
                0x01, 0x02, 0x03, 0x04, // seed
                0xAA, 0xBB, 0xCC, 0xDD, // xxhash
            ]
        );

        let mut payload = record.as_slice().to_vec();
        payload.extend_from_slice(b"image");
        let (parsed, rest) = MetadataRecord::parse(&payload).unwrap();
        assert_eq!(parsed.image_length(), 0x200);
        assert_eq!(parsed.metadata(), metadata);
        assert_eq!(rest, b"image");
    }

    #[test]
    fn test_record_too_short() {
        assert!(MetadataRecord::parse(&[0u8; 15]).is_none());
    }
}
