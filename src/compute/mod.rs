//! Compute module - Search engine and profiling.

pub mod evolution;
mod profiler;

pub use evolution::{Evo, EvolveError, EvolveStats, Population, SearchRng, StopReason};
pub use profiler::*;
