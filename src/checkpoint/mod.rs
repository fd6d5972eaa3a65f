//! Checkpoint module - Durable population snapshots shared across runs.
//!
//! # File Format
//!
//! ```text
//! Header (40 bytes):
//!   Magic: "EVCK" (4 bytes)
//!   Version: u16 (2 bytes)
//!   Flags: u16 (2 bytes) - compression in the low 4 bits
//!   EntryCount: u64 (8 bytes)
//!   PayloadLen: u64 (8 bytes)
//!   Reserved: 16 bytes
//!
//! Payload:
//!   JSON array of [score, candidate] pairs, optionally LZ4 compressed
//! ```

mod format;
mod store;

pub use format::{
    CHECKPOINT_MAGIC, CHECKPOINT_VERSION, CheckpointError, CheckpointHeader, CompressionType,
    read_checkpoint, write_checkpoint,
};
pub use store::{Checkpoint, FileCheckpoint, MemoryCheckpoint, merge};
