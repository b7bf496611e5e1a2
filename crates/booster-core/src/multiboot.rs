//! Multiboot header recognition and boot-target patching
//!
//! A bootable bitstream starts with a 32-byte multiboot header that tells
//! the FPGA boot ROM where to load from on the next warm boot. Byte 9 of
//! that header is the boot-target selector:
//!
//! | Offset | Meaning                                   |
//! |--------|-------------------------------------------|
//! | 0..4   | Magic `7E AA 99 7E`                       |
//! | 9      | Boot-target selector ([`BootSlot`])       |
//!
//! Every other byte is fixed. Images whose header differs anywhere but the
//! selector are not multiboot images and are refused.

use crate::cache::RamImageCache;
use crate::error::{Error, Result};

/// Length of the multiboot header
pub const HEADER_LEN: usize = 32;

/// Offset of the boot-target selector within the header
pub const SELECTOR_OFFSET: usize = 9;

/// Magic sequence at the start of every header
pub const MAGIC: [u8; 4] = [0x7e, 0xaa, 0x99, 0x7e];

/// Header template with the selector left as the default slot
const TEMPLATE: [u8; HEADER_LEN] = [
    0x7e, 0xaa, 0x99, 0x7e, 0x92, 0x00, 0x00, 0x44, //
    0x03, 0x03, 0x00, 0xa0, 0x82, 0x00, 0x00, 0x01, //
    0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
];

/// Boot target selected by the header's selector byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BootSlot {
    /// Normal target: boot the image that is in the window
    Default = 0x03,
    /// Redirected target: come back to the updater's recovery slot
    Updater = 0x04,
}

impl BootSlot {
    /// Selector byte value for this slot
    pub const fn selector(self) -> u8 {
        self as u8
    }

    /// Slot for a selector byte, if it is one of the known values
    pub const fn from_selector(value: u8) -> Option<Self> {
        match value {
            0x03 => Some(Self::Default),
            0x04 => Some(Self::Updater),
            _ => None,
        }
    }

    /// Full header this slot corresponds to
    pub const fn header(self) -> [u8; HEADER_LEN] {
        let mut header = TEMPLATE;
        header[SELECTOR_OFFSET] = self.selector();
        header
    }
}

/// Identify the boot slot of the header at the start of `image`
///
/// Every byte other than the selector must match the template exactly and
/// the selector must name a known slot.
pub fn identify(image: &[u8]) -> Result<BootSlot> {
    let header = image.get(..HEADER_LEN).ok_or_else(|| {
        log::error!("Image of {} bytes is too short for a multiboot header", image.len());
        Error::MissingMultiboot
    })?;

    if let Some((offset, (have, want))) = header
        .iter()
        .zip(TEMPLATE.iter())
        .enumerate()
        .find(|&(offset, (have, want))| offset != SELECTOR_OFFSET && have != want)
    {
        log::error!(
            "Multiboot header mismatch at offset {}: found 0x{:02X}, expected 0x{:02X}",
            offset,
            have,
            want
        );
        return Err(Error::MissingMultiboot);
    }

    BootSlot::from_selector(header[SELECTOR_OFFSET]).ok_or_else(|| {
        log::error!(
            "Unknown boot-target selector 0x{:02X}",
            header[SELECTOR_OFFSET]
        );
        Error::MissingMultiboot
    })
}

/// Point the cached image's boot target at the updater
///
/// Applied to the RAM copy before it is flashed, so that a reboot before
/// the update commits lands back in the updater instead of a half-written
/// image. Returns the slot the image selected before patching.
pub fn patch_to_updater(cache: &mut RamImageCache) -> Result<BootSlot> {
    let previous = identify(cache.as_slice())?;
    cache.patch(SELECTOR_OFFSET, BootSlot::Updater.selector())?;
    log::debug!(
        "Boot target patched: {:?} -> {:?}",
        previous,
        BootSlot::Updater
    );
    Ok(previous)
}
