//! Flash erase/program engine
//!
//! This module provides the primitive sector erase and page program
//! sequences and the differential rewrite built on top of them.

mod differential;
mod operations;

pub use differential::{rewrite, RewriteStats};
pub use operations::*;
