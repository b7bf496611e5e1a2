//! Update state machine
//!
//! Orchestrates one update run:
//!
//! ```text
//! WaitForTrigger -> ValidateSize -> ValidateHash -> CopyToRam
//!   -> ValidateHeader -> PatchHeader -> SwitchToDirectMode
//!   -> VerifyIdentity -> DifferentialRewrite -> Finalize -> Rebooted
//! ```
//!
//! Any validation failure moves to the terminal `Error` stage instead. No
//! flash command is issued before every validation gate has passed.

mod context;
mod machine;

pub use context::{Gates, Stage, UpdateContext, UpdateReport};
pub use machine::UpdateStateMachine;
