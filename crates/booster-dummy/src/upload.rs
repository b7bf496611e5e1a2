//! Emulated upload staging window

use std::cell::Cell;

use booster_core::device::UploadWindow;
use booster_core::hash::{self, ImageMetadata, MetadataRecord};

/// A staged upload, as the USB side would leave it in RAM
#[derive(Debug, Clone)]
pub struct DummyUpload {
    window: Vec<u8>,
    image_length: u32,
    metadata: ImageMetadata,
    spi_id: u32,
    polls_until_ready: Cell<u32>,
}

impl DummyUpload {
    /// Stage `image` with a correct digest over all of it
    pub fn new(image: &[u8], seed: u32, spi_id: u32) -> Self {
        let hash_length = image.len() as u32;
        let xxhash = hash::compute(image, hash_length, seed).unwrap_or_default();
        Self {
            window: image.to_vec(),
            image_length: hash_length,
            metadata: ImageMetadata {
                xxhash,
                seed,
                hash_length,
            },
            spi_id,
            polls_until_ready: Cell::new(0),
        }
    }

    /// Stage an install payload (metadata record followed by the image)
    ///
    /// Returns `None` if the payload is too short to hold a record.
    pub fn from_package(payload: &[u8], spi_id: u32) -> Option<Self> {
        let (record, image) = MetadataRecord::parse(payload)?;
        Some(Self {
            window: image.to_vec(),
            image_length: record.image_length(),
            metadata: record.metadata(),
            spi_id,
            polls_until_ready: Cell::new(0),
        })
    }

    /// Override the published metadata
    pub fn with_metadata(mut self, metadata: ImageMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Override the declared image length
    pub fn with_image_length(mut self, image_length: u32) -> Self {
        self.image_length = image_length;
        self
    }

    /// Report not-ready for the first `polls` readiness checks
    pub fn ready_after(self, polls: u32) -> Self {
        self.polls_until_ready.set(polls);
        self
    }

    /// Readiness checks still answered with not-ready
    pub fn pending_polls(&self) -> u32 {
        self.polls_until_ready.get()
    }

    /// The staging window contents
    pub fn window(&self) -> &[u8] {
        &self.window
    }
}

impl UploadWindow for DummyUpload {
    fn is_ready(&self) -> bool {
        let left = self.polls_until_ready.get();
        if left == 0 {
            return true;
        }
        self.polls_until_ready.set(left - 1);
        false
    }

    fn image_length(&self) -> u32 {
        self.image_length
    }

    fn metadata(&self) -> ImageMetadata {
        self.metadata
    }

    fn mapped_spi_id(&self) -> u32 {
        self.spi_id
    }

    fn source(&self) -> &[u8] {
        &self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_package() {
        let image = [0x11u8; 40];
        let staged = DummyUpload::new(&image, 5, 1);
        let record = MetadataRecord::new(40, &staged.metadata());
        let mut payload = Vec::new();
        payload.extend_from_slice(record.as_slice());
        payload.extend_from_slice(&image);

        let upload = DummyUpload::from_package(&payload, 1).unwrap();
        assert_eq!(upload.image_length(), 40);
        assert_eq!(upload.metadata(), staged.metadata());
        assert_eq!(upload.source(), &image);
    }

    #[test]
    fn test_ready_after() {
        let upload = DummyUpload::new(&[0u8; 4], 0, 0).ready_after(2);
        assert!(!upload.is_ready());
        assert!(!upload.is_ready());
        assert!(upload.is_ready());
        assert_eq!(upload.pending_polls(), 0);
    }
}
