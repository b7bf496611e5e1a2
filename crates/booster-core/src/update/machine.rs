//! The update state machine proper

use crate::cache::RamImageCache;
use crate::config::UpdaterConfig;
use crate::device::{
    busy_wait, halt, IndicatorMode, Platform, SpiFlash, StatusIndicator, UploadWindow,
};
use crate::error::{Error, Result};
use crate::flash::{erase_sector, program_page, rewrite};
use crate::hash;
use crate::multiboot::{self, BootSlot, SELECTOR_OFFSET};

use super::context::{Gates, Stage, UpdateContext, UpdateReport};

/// Drives one update run over the collaborators it borrows
///
/// Stages run strictly one after another on the caller's thread. The flash
/// controller mode is only ever changed from here (and from the rewrite it
/// invokes), so there is a single owner for it throughout.
pub struct UpdateStateMachine<'a, U, F, I, P>
where
    U: UploadWindow + ?Sized,
    F: SpiFlash + ?Sized,
    I: StatusIndicator + ?Sized,
    P: Platform + ?Sized,
{
    config: UpdaterConfig,
    upload: &'a U,
    flash: &'a mut F,
    indicator: &'a mut I,
    platform: &'a mut P,
    cache: &'a mut RamImageCache,
    ctx: UpdateContext,
}

impl<'a, U, F, I, P> UpdateStateMachine<'a, U, F, I, P>
where
    U: UploadWindow + ?Sized,
    F: SpiFlash + ?Sized,
    I: StatusIndicator + ?Sized,
    P: Platform + ?Sized,
{
    /// Create a state machine waiting for an upload
    pub fn new(
        config: UpdaterConfig,
        upload: &'a U,
        flash: &'a mut F,
        indicator: &'a mut I,
        platform: &'a mut P,
        cache: &'a mut RamImageCache,
    ) -> Self {
        Self {
            config,
            upload,
            flash,
            indicator,
            platform,
            cache,
            ctx: UpdateContext::new(),
        }
    }

    /// Current stage
    pub fn stage(&self) -> Stage {
        self.ctx.stage
    }

    /// State accumulated so far
    pub fn context(&self) -> &UpdateContext {
        &self.ctx
    }

    /// Run the current stage and move to the next one
    ///
    /// Terminal stages are sticky: stepping them again does nothing.
    pub fn step(&mut self) -> Stage {
        let stage = self.ctx.stage;
        let result = match stage {
            Stage::WaitForTrigger => self.wait_for_trigger(),
            Stage::ValidateSize => self.validate_size(),
            Stage::ValidateHash => self.validate_hash(),
            Stage::CopyToRam => self.copy_to_ram(),
            Stage::ValidateHeader => self.validate_header(),
            Stage::PatchHeader => self.patch_header(),
            Stage::SwitchToDirectMode => self.switch_to_direct_mode(),
            Stage::VerifyIdentity => self.verify_identity(),
            Stage::DifferentialRewrite => self.differential_rewrite(),
            Stage::Finalize => self.finalize(),
            Stage::Rebooted | Stage::Error(_) => return stage,
        };

        let next = match result {
            Ok(next) => next,
            Err(err) => self.fail(err),
        };
        log::debug!("Stage {:?} -> {:?}", stage, next);
        self.ctx.stage = next;
        next
    }

    /// Step until the run reboots or fails
    pub fn run(&mut self) -> Result<UpdateReport> {
        loop {
            match self.step() {
                Stage::Rebooted => return Ok(self.ctx.report()),
                Stage::Error(err) => return Err(err),
                _ => {}
            }
        }
    }

    /// Firmware entry: run the update, then never return
    ///
    /// On success the reboot controller has already taken over. On error
    /// the device is left inert with the error code readable in memory;
    /// recovery is external.
    pub fn run_forever(mut self) -> ! {
        if let Err(err) = self.run() {
            log::error!("Update halted: {}", err);
        }
        halt()
    }

    fn fail(&mut self, err: Error) -> Stage {
        let err = self.ctx.record_error(err);
        log::error!("Update failed in {:?}: {}", self.ctx.stage, err);
        self.indicator.set_mode(IndicatorMode::Error);
        Stage::Error(err)
    }

    fn wait_for_trigger(&mut self) -> Result<Stage> {
        self.indicator.set_mode(IndicatorMode::Idle);
        log::info!("Waiting for an image upload");
        while !self.upload.is_ready() {
            core::hint::spin_loop();
        }
        Ok(Stage::ValidateSize)
    }

    fn validate_size(&mut self) -> Result<Stage> {
        let image_length = self.upload.image_length();
        let source_len = self.upload.source().len();
        if image_length as usize > self.cache.capacity() || image_length as usize > source_len {
            log::error!(
                "Image of {} bytes does not fit (cache {} bytes, window {} bytes)",
                image_length,
                self.cache.capacity(),
                source_len
            );
            return Err(Error::InvalidImageSize);
        }
        log::info!("Image staged: {} bytes", image_length);
        self.ctx.image_length = image_length;
        self.ctx.gates |= Gates::SIZE;
        Ok(Stage::ValidateHash)
    }

    fn validate_hash(&mut self) -> Result<Stage> {
        let metadata = self.upload.metadata();
        let digest = hash::compute(self.upload.source(), metadata.hash_length, metadata.seed)?;
        self.ctx.calculated_hash = Some(digest);
        if digest != metadata.xxhash {
            log::error!(
                "Hash mismatch: computed 0x{:08X}, expected 0x{:08X}",
                digest,
                metadata.xxhash
            );
            return Err(Error::HashMismatch);
        }
        log::debug!("Hash 0x{:08X} verified over {} bytes", digest, metadata.hash_length);
        self.ctx.gates |= Gates::HASH;
        Ok(Stage::CopyToRam)
    }

    fn copy_to_ram(&mut self) -> Result<Stage> {
        let len = self.ctx.image_length as usize;
        let src = self
            .upload
            .source()
            .get(..len)
            .ok_or(Error::InvalidImageSize)?;
        self.cache.fill(src)?;
        log::debug!("Copied {} bytes to the RAM cache", len);
        Ok(Stage::ValidateHeader)
    }

    fn validate_header(&mut self) -> Result<Stage> {
        let slot = multiboot::identify(self.cache.as_slice())?;
        self.ctx.previous_slot = Some(slot);
        self.ctx.gates |= Gates::HEADER;
        Ok(Stage::PatchHeader)
    }

    fn patch_header(&mut self) -> Result<Stage> {
        multiboot::patch_to_updater(self.cache)?;
        Ok(Stage::SwitchToDirectMode)
    }

    fn switch_to_direct_mode(&mut self) -> Result<Stage> {
        // The published identity lives in flash, so capture it before the
        // memory map goes away.
        self.ctx.cached_spi_id = Some(self.upload.mapped_spi_id());
        self.flash.set_direct_access(true);
        busy_wait(self.flash);
        Ok(Stage::VerifyIdentity)
    }

    fn verify_identity(&mut self) -> Result<Stage> {
        let read_id = self.flash.read_id();
        self.ctx.read_spi_id = Some(read_id);
        let cached_id = self.ctx.cached_spi_id.unwrap_or_default();
        if cached_id != read_id {
            log::error!(
                "SPI identity mismatch: mapped 0x{:08X}, direct 0x{:08X}",
                cached_id,
                read_id
            );
            return Err(Error::SpiMismatch);
        }
        log::debug!("SPI identity 0x{:08X} confirmed", read_id);
        self.ctx.gates |= Gates::IDENTITY;
        Ok(Stage::DifferentialRewrite)
    }

    fn differential_rewrite(&mut self) -> Result<Stage> {
        debug_assert!(self.ctx.gates.is_all(), "rewrite with gates {:?}", self.ctx.gates);
        let stats = rewrite(
            self.flash,
            self.indicator,
            self.cache.as_slice(),
            self.config.flash_window_limit,
        );
        self.ctx.stats = Some(stats);
        Ok(Stage::Finalize)
    }

    fn finalize(&mut self) -> Result<Stage> {
        debug_assert!(self.ctx.gates.is_all(), "finalize with gates {:?}", self.ctx.gates);
        self.indicator.set_mode(IndicatorMode::Writing);
        self.platform.delay_ms(self.config.settle_delay_ms);

        // Next boot goes to the freshly written image, not back here
        program_page(
            self.flash,
            SELECTOR_OFFSET as u32,
            &[BootSlot::Default.selector()],
        );
        erase_sector(self.flash, self.config.booster_offset);
        busy_wait(self.flash);

        log::info!(
            "Update committed, rebooting into image {}",
            self.config.reboot_image_index
        );
        self.platform.reboot(self.config.reboot_image_index);
        Ok(Stage::Rebooted)
    }
}
