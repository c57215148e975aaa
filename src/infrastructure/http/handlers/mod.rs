//! HTTP Handlers

mod synthesize;
mod system;

pub use synthesize::*;
pub use system::*;
