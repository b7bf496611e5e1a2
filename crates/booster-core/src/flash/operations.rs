//! Primitive flash sequences
//!
//! Each helper waits for the chip to go idle before starting its command,
//! so callers can chain them without their own polling.

use crate::device::{busy_wait, SpiFlash};
use crate::geometry::FlashGeometry;

/// Erase the sector that contains `addr`
pub fn erase_sector<F: SpiFlash + ?Sized>(flash: &mut F, addr: u32) {
    busy_wait(flash);
    log::trace!("Erasing sector at 0x{:08X}", addr);
    flash.begin_erase(addr);
}

/// Program `data` at `addr`, which must not cross a page boundary
pub fn program_page<F: SpiFlash + ?Sized>(flash: &mut F, addr: u32, data: &[u8]) {
    debug_assert!(
        data.len() <= FlashGeometry::FIXED.program_page_size,
        "program of {} bytes exceeds a page",
        data.len()
    );
    busy_wait(flash);
    log::trace!("Programming {} bytes at 0x{:08X}", data.len(), addr);
    flash.begin_write(addr, data);
}
