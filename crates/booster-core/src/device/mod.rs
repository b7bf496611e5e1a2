//! Collaborator interfaces
//!
//! The updater core never touches registers. Flash, status LED, timer,
//! reboot controller and the USB upload window are all reached through the
//! traits defined here.

mod traits;

pub use traits::*;
