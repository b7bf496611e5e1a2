//! booster-core - Fail-safe self-reflashing core for an FPGA SoC updater
//!
//! This crate takes a candidate bitstream staged in RAM by a host upload,
//! validates it, and rewrites the external SPI NOR flash with it while
//! keeping the device bootable if the update is interrupted. It is `no_std`
//! and allocation-free so that it can run from RAM on the device itself.
//!
//! The hardware is reached only through the traits in [`device`]; the
//! firmware supplies register-level implementations and the host side uses
//! the emulator in `booster-dummy`.
//!
//! # Features
//!
//! - `std` - Enable standard library support
//! - `serde` - Derive `Deserialize` for [`config::UpdaterConfig`]
//!
//! # Example
//!
//! ```ignore
//! use booster_core::cache::RamImageCache;
//! use booster_core::update::UpdateStateMachine;
//!
//! static mut CACHE: RamImageCache = RamImageCache::new();
//!
//! fn main_loop(upload: &Upload, flash: &mut Spi, rgb: &mut Rgb, soc: &mut Soc) -> ! {
//!     let cache = unsafe { &mut *core::ptr::addr_of_mut!(CACHE) };
//!     UpdateStateMachine::new(Default::default(), upload, flash, rgb, soc, cache)
//!         .run_forever()
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod cache;
pub mod config;
pub mod device;
pub mod error;
pub mod flash;
pub mod geometry;
pub mod hash;
pub mod irq;
pub mod multiboot;
pub mod update;

pub use error::{Error, ErrorCode, Result};
