//! booster-dummy - In-memory emulation of the updater's collaborators
//!
//! This crate provides a dummy flash controller, status indicator, platform
//! and upload window so that the update state machine can be exercised
//! without hardware. The flash emulation enforces the controller rules the
//! core relies on (mode exclusivity, busy polling, page boundaries) and
//! records any misuse as a [`Violation`].

mod flash;
mod peripherals;
mod upload;

pub use flash::{DummyConfig, DummyFlash, FlashOp, Violation};
pub use peripherals::{DummyIndicator, DummyPlatform};
pub use upload::DummyUpload;

#[cfg(test)]
mod tests {
    use super::*;
    use booster_core::cache::RamImageCache;
    use booster_core::config::UpdaterConfig;
    use booster_core::device::{IndicatorMode, UploadWindow};
    use booster_core::geometry::{BOOSTER_OFFSET, ERASE_SECTOR_SIZE, PROGRAM_PAGE_SIZE};
    use booster_core::hash::ImageMetadata;
    use booster_core::multiboot::{BootSlot, SELECTOR_OFFSET};
    use booster_core::update::{Stage, UpdateContext, UpdateReport, UpdateStateMachine};
    use booster_core::Error;

    const SEED: u32 = 0x5EED_0001;

    /// A bitstream of `len` bytes starting with the header for `slot`
    fn bitstream(slot: BootSlot, len: usize) -> Vec<u8> {
        let mut data = slot.header().to_vec();
        data.extend((data.len()..len).map(|i| (i as u8).wrapping_mul(13) ^ 0xA5));
        data
    }

    /// The image as it will be flashed, with the boot target redirected
    fn patched(image: &[u8]) -> Vec<u8> {
        let mut data = image.to_vec();
        data[SELECTOR_OFFSET] = BootSlot::Updater.selector();
        data
    }

    struct Run {
        result: Result<UpdateReport, Error>,
        ctx: UpdateContext,
        cache: Box<RamImageCache>,
        indicator: DummyIndicator,
        platform: DummyPlatform,
    }

    fn run(config: UpdaterConfig, upload: &DummyUpload, flash: &mut DummyFlash) -> Run {
        let mut cache = Box::new(RamImageCache::new());
        let mut indicator = DummyIndicator::default();
        let mut platform = DummyPlatform::default();
        let (result, ctx) = {
            let mut sm = UpdateStateMachine::new(
                config,
                upload,
                flash,
                &mut indicator,
                &mut platform,
                &mut cache,
            );
            let result = sm.run();
            (result, sm.context().clone())
        };
        Run {
            result,
            ctx,
            cache,
            indicator,
            platform,
        }
    }

    /// Flash ops issued by the finalize sequence
    fn finalize_ops() -> Vec<FlashOp> {
        vec![
            FlashOp::Program {
                addr: SELECTOR_OFFSET as u32,
                len: 1,
            },
            FlashOp::Erase(BOOSTER_OFFSET),
        ]
    }

    #[test]
    fn test_identical_sector_only_finalizes() {
        let image = bitstream(BootSlot::Default, ERASE_SECTOR_SIZE);
        let upload = DummyUpload::new(&image, SEED, DummyConfig::default().spi_id);
        let mut flash = DummyFlash::with_data(DummyConfig::default(), &patched(&image));

        let run = run(UpdaterConfig::default(), &upload, &mut flash);

        let report = run.result.unwrap();
        assert_eq!(report.stats.sectors_checked, 1);
        assert_eq!(report.stats.sectors_skipped, 1);
        assert!(!report.stats.flash_modified());
        let writes: Vec<FlashOp> = flash.writes().cloned().collect();
        assert_eq!(writes, finalize_ops());
        assert_eq!(run.platform.reboots, [2]);
        assert_eq!(run.platform.delays, [1000]);
        assert!(run.indicator.ticks.is_empty());
        assert_eq!(run.indicator.mode(), IndicatorMode::Writing);
        assert!(flash.violations().is_empty());
    }

    #[test]
    fn test_only_changed_middle_sector_rewritten() {
        let image = bitstream(BootSlot::Default, 3 * ERASE_SECTOR_SIZE);
        let mut old = patched(&image);
        old[ERASE_SECTOR_SIZE + 1234] ^= 0x01;
        let mut flash = DummyFlash::with_data(DummyConfig::default(), &old);
        let upload = DummyUpload::new(&image, SEED, DummyConfig::default().spi_id);

        let run = run(UpdaterConfig::default(), &upload, &mut flash);

        let report = run.result.unwrap();
        assert_eq!(report.stats.sectors_erased, 1);
        assert_eq!(report.stats.sectors_skipped, 2);

        let writes: Vec<FlashOp> = flash.writes().cloned().collect();
        let (rewrite, finalize) = writes.split_at(writes.len() - 2);
        assert_eq!(finalize, finalize_ops());
        assert_eq!(rewrite[0], FlashOp::Erase(ERASE_SECTOR_SIZE as u32));
        let programs = &rewrite[1..];
        assert_eq!(programs.len(), ERASE_SECTOR_SIZE / PROGRAM_PAGE_SIZE);
        for (page, op) in programs.iter().enumerate() {
            assert_eq!(
                op,
                &FlashOp::Program {
                    addr: (ERASE_SECTOR_SIZE + page * PROGRAM_PAGE_SIZE) as u32,
                    len: PROGRAM_PAGE_SIZE,
                }
            );
        }
        assert_eq!(run.indicator.ticks.len(), programs.len());
        assert!(flash.violations().is_empty());
    }

    #[test]
    fn test_full_update_contents() {
        let image = bitstream(BootSlot::Default, 5 * ERASE_SECTOR_SIZE + 77);
        let mut flash = DummyFlash::with_data(DummyConfig::default(), &vec![0u8; 0x1_0000]);
        flash.data_mut()[BOOSTER_OFFSET as usize..][..ERASE_SECTOR_SIZE].fill(0x00);
        let upload = DummyUpload::new(&image, SEED, DummyConfig::default().spi_id);

        let run = run(UpdaterConfig::default(), &upload, &mut flash);

        let report = run.result.unwrap();
        assert_eq!(report.image_length, image.len() as u32);
        assert_eq!(report.previous_slot, Some(BootSlot::Default));
        assert_eq!(report.stats.sectors_erased, 6);
        assert_eq!(report.stats.bytes_programmed, image.len());

        let mut expected = patched(&image);
        // The revert programs the default selector over the patched one;
        // NOR programming can only clear bits.
        expected[SELECTOR_OFFSET] &= BootSlot::Default.selector();
        assert_eq!(&flash.data()[..image.len()], &expected[..]);

        let booster = &flash.data()[BOOSTER_OFFSET as usize..][..ERASE_SECTOR_SIZE];
        assert!(booster.iter().all(|&b| b == 0xFF));
        assert!(flash.violations().is_empty());
        assert!(flash.is_direct());
    }

    #[test]
    fn test_busy_chip_is_polled() {
        let config = DummyConfig {
            busy_polls: 5,
            ..Default::default()
        };
        let image = bitstream(BootSlot::Updater, 2 * ERASE_SECTOR_SIZE);
        let mut flash = DummyFlash::new(config.clone());
        let upload = DummyUpload::new(&image, SEED, config.spi_id).ready_after(10);

        let run = run(UpdaterConfig::default(), &upload, &mut flash);

        assert!(run.result.is_ok());
        assert_eq!(upload.pending_polls(), 0);
        assert!(flash.violations().is_empty(), "{:?}", flash.violations());
    }

    #[test]
    fn test_corrupt_digest_halts_without_flash_access() {
        let image = bitstream(BootSlot::Default, 2 * ERASE_SECTOR_SIZE);
        let upload = DummyUpload::new(&image, SEED, DummyConfig::default().spi_id);
        let metadata = ImageMetadata {
            xxhash: upload.metadata().xxhash ^ 0x8000_0000,
            ..upload.metadata()
        };
        let upload = upload.with_metadata(metadata);
        let mut flash = DummyFlash::new(DummyConfig::default());

        let run = run(UpdaterConfig::default(), &upload, &mut flash);

        assert_eq!(run.result.unwrap_err(), Error::HashMismatch);
        assert_eq!(run.ctx.stage, Stage::Error(Error::HashMismatch));
        assert_eq!(run.ctx.error_code.as_u32(), 2);
        assert!(run.cache.is_empty());
        assert!(flash.ops().is_empty());
        assert!(run.platform.reboots.is_empty());
        assert_eq!(run.indicator.mode(), IndicatorMode::Error);
    }

    #[test]
    fn test_oversized_image() {
        let image = bitstream(BootSlot::Default, RamImageCache::new().capacity() + 1);
        let upload = DummyUpload::new(&image, SEED, DummyConfig::default().spi_id);
        let mut flash = DummyFlash::new(DummyConfig::default());

        let run = run(UpdaterConfig::default(), &upload, &mut flash);

        assert_eq!(run.result.unwrap_err(), Error::InvalidImageSize);
        assert_eq!(run.ctx.calculated_hash, None);
        assert!(run.cache.is_empty());
        assert!(flash.ops().is_empty());
    }

    #[test]
    fn test_not_a_bitstream() {
        let mut image = bitstream(BootSlot::Default, ERASE_SECTOR_SIZE);
        image[20] = 0xEE;
        let upload = DummyUpload::new(&image, SEED, DummyConfig::default().spi_id);
        let mut flash = DummyFlash::new(DummyConfig::default());

        let run = run(UpdaterConfig::default(), &upload, &mut flash);

        assert_eq!(run.result.unwrap_err(), Error::MissingMultiboot);
        assert_eq!(run.ctx.error_code.as_u32(), 4);
        assert!(flash.ops().is_empty());
    }

    #[test]
    fn test_identity_mismatch() {
        let image = bitstream(BootSlot::Default, ERASE_SECTOR_SIZE);
        let upload = DummyUpload::new(&image, SEED, 0x00EF_4018);
        let mut flash = DummyFlash::new(DummyConfig::default());

        let run = run(UpdaterConfig::default(), &upload, &mut flash);

        assert_eq!(run.result.unwrap_err(), Error::SpiMismatch);
        assert_eq!(flash.ops(), [FlashOp::SetDirect(true), FlashOp::ReadId]);
        assert_eq!(flash.writes().count(), 0);
        // The cached copy was already patched; only flash stays untouched
        assert_eq!(run.cache.as_slice()[SELECTOR_OFFSET], 0x04);
    }

    #[test]
    fn test_window_limit_bounds_rewrite() {
        let config = UpdaterConfig {
            flash_window_limit: 2 * ERASE_SECTOR_SIZE as u32,
            ..Default::default()
        };
        let image = bitstream(BootSlot::Default, 4 * ERASE_SECTOR_SIZE);
        let upload = DummyUpload::new(&image, SEED, DummyConfig::default().spi_id);
        let mut flash = DummyFlash::new(DummyConfig::default());

        let run = run(config, &upload, &mut flash);

        let report = run.result.unwrap();
        assert_eq!(report.stats.sectors_checked, 2);
        assert!(flash.data()[2 * ERASE_SECTOR_SIZE..4 * ERASE_SECTOR_SIZE]
            .iter()
            .all(|&b| b == 0xFF));
    }

    #[test]
    fn test_install_package_round_trip() {
        use booster_core::hash::MetadataRecord;

        let image = bitstream(BootSlot::Default, ERASE_SECTOR_SIZE / 2);
        let staged = DummyUpload::new(&image, SEED, 0);
        let record = MetadataRecord::new(image.len() as u32, &staged.metadata());
        let mut payload = record.as_slice().to_vec();
        payload.extend_from_slice(&image);

        let spi_id = DummyConfig::default().spi_id;
        let upload = DummyUpload::from_package(&payload, spi_id).unwrap();
        let mut flash = DummyFlash::new(DummyConfig::default());

        let run = run(UpdaterConfig::default(), &upload, &mut flash);

        let report = run.result.unwrap();
        assert_eq!(report.hash, staged.metadata().xxhash);
        assert_eq!(report.stats.bytes_programmed, image.len());
    }
}
