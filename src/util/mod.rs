//! Basic types shared across the crate: errors, color spaces, diagnostics.

mod color_space;
mod diagnostics;
mod error;

pub use color_space::*;
pub use diagnostics::*;
pub use error::*;
