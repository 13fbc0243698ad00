//! # eepromrw
//!
//! A library for writing and reading EEPROM chips through a supervisory
//! serial controller.
//!
//! The host drives every transfer: it resets the controller, selects a
//! direction and a chip, then moves the image in fixed 16-byte chunks. Every
//! chunk is announced, sized, transferred and checksummed, with the
//! controller confirming each step by a 3-byte status token; a rejected
//! checksum restarts that chunk's exchange.
//!
//! ## Layers
//!
//! - [`port`]: the serial link (open, timeouts, enumeration)
//! - [`protocol`]: wire tokens and the chunked transfer engine
//! - [`target`]: supported chips and the session orchestrator
//! - [`progress`]: display-only progress-bar scaling
//!
//! ## Example
//!
//! ```rust,no_run
//! use eepromrw::{Chip, Programmer};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let image = std::fs::read("image.bin")?;
//!
//!     let mut programmer = Programmer::open("/dev/ttyUSB0")?;
//!     programmer.write_image(Chip::Aa24512, &image, |done, total| {
//!         println!("chunk {done}/{total}");
//!     })?;
//!     programmer.close()?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod host;
pub mod port;
pub mod progress;
pub mod protocol;
pub mod target;

// Re-exports for convenience
pub use {
    error::{ChunkStage, Error, Result},
    host::{discover_ports, port_exists},
    port::{NativePort, Port, PortEnumerator, PortInfo, SerialConfig},
    progress::{ProgressState, find_lowest_bar_divider},
    protocol::link::{ChunkLink, LinkConfig, Status},
    protocol::wire::{BAUD, CHUNK_SIZE, Mode},
    target::{Chip, Programmer, TransferPlan},
};
