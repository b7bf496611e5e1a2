//! Flash geometry and fixed memory layout
//!
//! The updater only ever talks to one kind of SPI NOR part, so the erase
//! and program granularities are compile-time constants rather than values
//! probed from the chip.

/// Smallest erasable unit of the flash chip
pub const ERASE_SECTOR_SIZE: usize = 4096;

/// Largest unit a single page-program command may write
pub const PROGRAM_PAGE_SIZE: usize = 256;

/// Capacity of the RAM cache the image is copied into before flashing
pub const RAM_CACHE_CAPACITY: usize = 0x1a000;

/// End (exclusive) of the flash window the updater rewrites
pub const FLASH_WINDOW_LIMIT: u32 = 0x2_0000;

/// Offset of the recovery image. Never touched by the updater.
pub const RECOVERY_IMAGE_OFFSET: u32 = 0x4_0000;

/// Offset of the updater's own bitstream, erased when the update commits
pub const BOOSTER_OFFSET: u32 = 0x5_a000;

/// CPU address at which the flash appears while memory-mapped
pub const FLASH_MAP_BASE: u32 = 0x2000_0000;

/// CPU address of the window the host upload stages the image into
pub const STAGING_BASE: u32 = 0x2004_0000;

/// Image index handed to the reboot controller after a successful update
pub const REBOOT_IMAGE_INDEX: u8 = 2;

/// Delay between the last program and the commit sequence
pub const SETTLE_DELAY_MS: u32 = 1000;

/// Physical write granularity of the flash chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashGeometry {
    /// Erase sector size in bytes
    pub erase_sector_size: usize,
    /// Program page size in bytes
    pub program_page_size: usize,
}

impl FlashGeometry {
    /// The geometry of the fitted flash chip
    pub const FIXED: Self = Self {
        erase_sector_size: ERASE_SECTOR_SIZE,
        program_page_size: PROGRAM_PAGE_SIZE,
    };

    /// Number of program pages that cover one erase sector
    pub const fn pages_per_sector(&self) -> usize {
        self.erase_sector_size.div_ceil(self.program_page_size)
    }

    /// Round `addr` down to the start of its erase sector
    pub const fn sector_base(&self, addr: u32) -> u32 {
        addr - (addr % self.erase_sector_size as u32)
    }

    /// Check if `addr` sits on an erase sector boundary
    pub const fn is_sector_aligned(&self, addr: u32) -> bool {
        addr % self.erase_sector_size as u32 == 0
    }

    /// Number of sectors needed to hold `len` bytes
    pub const fn sectors_for(&self, len: usize) -> usize {
        len.div_ceil(self.erase_sector_size)
    }
}

impl Default for FlashGeometry {
    fn default() -> Self {
        Self::FIXED
    }
}
