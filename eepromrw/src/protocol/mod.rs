//! Link-level transfer protocol.

pub mod link;
pub mod wire;

// Re-export common types
pub use link::{ChunkLink, LinkConfig, Status};
pub use wire::{BAUD, CHUNK_SIZE, Mode, checksum};
