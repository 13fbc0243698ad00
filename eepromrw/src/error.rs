//! Error types for eepromrw.

use std::fmt;
use std::io;
use thiserror::Error;

/// Result type for eepromrw operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Protocol step at which the controller rejected a chunk exchange.
///
/// Rejections at these steps abort the session; only a rejected checksum is
/// retried in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkStage {
    /// The `chk` announcement was nacked.
    Announce,
    /// The 2-byte chunk size was nacked.
    Size,
    /// The payload bytes were nacked.
    Payload,
}

impl fmt::Display for ChunkStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Announce => write!(f, "announce"),
            Self::Size => write!(f, "size"),
            Self::Payload => write!(f, "payload"),
        }
    }
}

/// Error type for eepromrw operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (serial port, file operations).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serial port error.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// Named serial port is not present on this host.
    #[error("Serial port not found: {0}")]
    PortNotFound(String),

    /// The controller did not answer before the deadline.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// The controller rejected the reset/mode/chip-select handshake.
    #[error("Handshake rejected by controller")]
    HandshakeRejected,

    /// The controller rejected a chunk at a non-recoverable step.
    #[error("Chunk {0} step rejected by controller")]
    ChunkRejected(ChunkStage),

    /// The checksum exchange kept failing after the allowed retries.
    #[error("Chunk retries exhausted after {attempts} attempts")]
    RetryExhausted {
        /// Attempts made before giving up.
        attempts: u32,
    },

    /// The controller delivered fewer payload bytes than requested.
    #[error("Missing data: expected {expected} bytes, received {actual}")]
    ShortRead {
        /// Bytes requested from the controller.
        expected: usize,
        /// Bytes actually received.
        actual: usize,
    },

    /// Chip name is not in the supported set.
    #[error("Unsupported chip: {0}")]
    UnknownChip(String),
}
