//! Schema module - Configuration, score and problem types.

mod assignment;
mod config;
mod score;

pub use assignment::*;
pub use config::*;
pub use score::*;
