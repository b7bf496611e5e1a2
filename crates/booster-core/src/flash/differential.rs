//! Differential sector rewrite
//!
//! Flash cells wear out and programming is slow, so the image is written
//! sector by sector and only sectors whose contents actually differ are
//! erased and reprogrammed. A typical update touches a minority of the
//! window.

use crate::device::{busy_wait, SpiFlash, StatusIndicator};
use crate::geometry::{FlashGeometry, ERASE_SECTOR_SIZE};

use super::operations::{erase_sector, program_page};

/// First value of the progress colour wheel
const TICK_START: u8 = 80;

/// Colour wheel advance per programmed page
const TICK_STEP: u8 = 10;

/// Statistics from a differential rewrite
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteStats {
    /// Sectors compared against the image
    pub sectors_checked: usize,
    /// Sectors already matching, left untouched
    pub sectors_skipped: usize,
    /// Sectors erased and reprogrammed
    pub sectors_erased: usize,
    /// Page program commands issued
    pub pages_programmed: usize,
    /// Bytes programmed
    pub bytes_programmed: usize,
}

impl RewriteStats {
    /// Whether any erase or program was issued
    pub fn flash_modified(&self) -> bool {
        self.sectors_erased > 0
    }
}

/// Make flash `[0, min(image.len(), limit))` equal to `image`
///
/// The controller must already be in direct access mode. Each sector is
/// read back through the memory map once the chip is idle (switching modes
/// around the read), compared with the matching image slice and, only if it
/// differs, erased and programmed page by page. Image bytes at or past `limit` are not
/// written.
pub fn rewrite<F, I>(flash: &mut F, indicator: &mut I, image: &[u8], limit: u32) -> RewriteStats
where
    F: SpiFlash + ?Sized,
    I: StatusIndicator + ?Sized,
{
    let geo = FlashGeometry::FIXED;
    let end = image.len().min(limit as usize);
    let mut scratch = [0u8; ERASE_SECTOR_SIZE];
    let mut stats = RewriteStats::default();
    let mut tick = TICK_START;

    log::info!(
        "Rewriting {} bytes ({} sectors) of flash",
        end,
        geo.sectors_for(end)
    );

    for (index, want) in image[..end].chunks(geo.erase_sector_size).enumerate() {
        let sector_addr = (index * geo.erase_sector_size) as u32;
        let have = &mut scratch[..want.len()];
        stats.sectors_checked += 1;

        // The last page program may still be running
        busy_wait(flash);
        flash.set_direct_access(false);
        flash.read_mapped(sector_addr, have);
        flash.set_direct_access(true);

        if have == want {
            log::trace!("Sector 0x{:08X} unchanged", sector_addr);
            stats.sectors_skipped += 1;
            continue;
        }

        log::debug!("Sector 0x{:08X} differs, rewriting", sector_addr);
        erase_sector(flash, sector_addr);
        stats.sectors_erased += 1;

        for (page, data) in want.chunks(geo.program_page_size).enumerate() {
            tick = tick.wrapping_add(TICK_STEP);
            indicator.tick(tick);
            program_page(
                flash,
                sector_addr + (page * geo.program_page_size) as u32,
                data,
            );
            stats.pages_programmed += 1;
            stats.bytes_programmed += data.len();
        }
    }

    log::info!(
        "Rewrite done: {} sectors erased, {} skipped, {} bytes programmed",
        stats.sectors_erased,
        stats.sectors_skipped,
        stats.bytes_programmed
    );
    stats
}
