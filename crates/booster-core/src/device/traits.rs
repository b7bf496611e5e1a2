//! Collaborator trait definitions
//!
//! Everything here is synchronous. The device has a single thread of
//! control and nothing to yield to, so "waiting" always means spin-polling
//! a busy bit.

use crate::hash::ImageMetadata;

/// SPI flash controller with memory-mapped and direct (bit-banged) modes
///
/// The controller cannot serve memory-mapped reads and raw SPI commands at
/// the same time. Erase, program and identity reads require direct access;
/// [`read_mapped`](SpiFlash::read_mapped) requires it to be off.
///
/// Erase and program only *start* an operation. Callers must poll
/// [`is_busy`](SpiFlash::is_busy) (see [`busy_wait`]) before issuing the
/// next command.
pub trait SpiFlash {
    /// Whether the chip is still executing an erase or program
    fn is_busy(&mut self) -> bool;

    /// Start erasing the sector containing `addr`
    fn begin_erase(&mut self, addr: u32);

    /// Start programming `data` at `addr`
    ///
    /// `data` never crosses a program page boundary.
    fn begin_write(&mut self, addr: u32, data: &[u8]);

    /// Read the chip identity over direct access
    fn read_id(&mut self) -> u32;

    /// Enable or disable direct access (disabling re-enables memory mapping)
    fn set_direct_access(&mut self, enabled: bool);

    /// Copy flash contents at flash offset `addr` through the memory map
    fn read_mapped(&mut self, addr: u32, buf: &mut [u8]);
}

/// Visual state of the RGB status indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndicatorMode {
    /// Waiting for, or validating, an upload
    #[default]
    Idle,
    /// A terminal error occurred
    Error,
    /// Committing the update
    Writing,
}

/// RGB status indicator. Purely observational.
pub trait StatusIndicator {
    /// Switch to a new indicator pattern
    fn set_mode(&mut self, mode: IndicatorMode);

    /// Advance the progress colour wheel to `value`
    fn tick(&mut self, value: u8);
}

/// Timer and reboot controller
pub trait Platform {
    /// Block for `ms` milliseconds
    fn delay_ms(&mut self, ms: u32);

    /// Warm-boot into the image at `image_index`
    ///
    /// On hardware this never returns. Emulations record the request and
    /// return so the caller can observe the final state.
    fn reboot(&mut self, image_index: u8);
}

/// The RAM window the host upload stages an image into
///
/// Once [`is_ready`](UploadWindow::is_ready) returns true the uploader must
/// not touch the window again; the updater relies on the bytes staying put
/// until they have been hashed and copied.
pub trait UploadWindow {
    /// Whether the host has finished staging an image
    fn is_ready(&self) -> bool;

    /// Declared image length in bytes
    fn image_length(&self) -> u32;

    /// Digest metadata published alongside the image
    fn metadata(&self) -> ImageMetadata;

    /// Flash identity recorded while the flash was still memory-mapped
    fn mapped_spi_id(&self) -> u32;

    /// The whole staging window, starting at the first image byte
    fn source(&self) -> &[u8];
}

/// Wait for the flash to finish any pending operation
pub fn busy_wait<F: SpiFlash + ?Sized>(flash: &mut F) {
    while flash.is_busy() {
        core::hint::spin_loop();
    }
}

/// Value written to the reboot control register to boot `image_index`
pub const fn reboot_ctrl_value(image_index: u8) -> u8 {
    0xac | (image_index & 3)
}

/// Spin forever
///
/// Used after a terminal error: the device stays inert until it is power
/// cycled or recovered over the debug interface.
pub fn halt() -> ! {
    loop {
        core::hint::spin_loop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountdownFlash {
        busy_polls: u32,
        polls: u32,
    }

    impl SpiFlash for CountdownFlash {
        fn is_busy(&mut self) -> bool {
            self.polls += 1;
            if self.busy_polls == 0 {
                return false;
            }
            self.busy_polls -= 1;
            true
        }
        fn begin_erase(&mut self, _addr: u32) {}
        fn begin_write(&mut self, _addr: u32, _data: &[u8]) {}
        fn read_id(&mut self) -> u32 {
            0
        }
        fn set_direct_access(&mut self, _enabled: bool) {}
        fn read_mapped(&mut self, _addr: u32, _buf: &mut [u8]) {}
    }

    #[test]
    fn test_busy_wait_polls_until_idle() {
        let mut flash = CountdownFlash {
            busy_polls: 3,
            polls: 0,
        };
        busy_wait(&mut flash);
        assert_eq!(flash.polls, 4);

        busy_wait(&mut flash);
        assert_eq!(flash.polls, 5);
    }

    #[test]
    fn test_reboot_ctrl_value() {
        assert_eq!(reboot_ctrl_value(0), 0xac);
        assert_eq!(reboot_ctrl_value(2), 0xae);
        assert_eq!(reboot_ctrl_value(3), 0xaf);
        // Only the low two bits select the image
        assert_eq!(reboot_ctrl_value(6), 0xae);
    }
}
