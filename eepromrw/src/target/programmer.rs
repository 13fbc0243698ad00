//! EEPROM programmer: full-image transfer orchestration.
//!
//! One `Programmer` owns one serial session. A transfer is the handshake
//! followed by `chunk_count` full chunk exchanges and exactly one trailing
//! remainder exchange, which the controller expects even when it carries no
//! bytes.

use crate::error::{Error, Result};
use crate::port::{NativePort, Port, SerialConfig};
use crate::protocol::link::{ChunkLink, LinkConfig};
use crate::protocol::wire::{self, CHUNK_SIZE, Mode};
use crate::target::chip::Chip;
use log::{debug, info};
use std::thread;
use std::time::Duration;

/// Delay between chunk exchanges, matching the controller's write cadence.
const PACING_DELAY: Duration = Duration::from_millis(50);

/// Settle time after opening the port; the controller resets on open.
const SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Breakdown of a transfer into full chunks plus a remainder chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferPlan {
    /// Total bytes to move.
    pub total: usize,
    /// Number of full [`CHUNK_SIZE`] chunks.
    pub chunk_count: usize,
    /// Bytes in the trailing remainder chunk (`0..CHUNK_SIZE`).
    pub remainder: usize,
}

impl TransferPlan {
    /// Plan a transfer of `total` bytes.
    pub fn new(total: usize) -> Self {
        Self {
            total,
            chunk_count: total / CHUNK_SIZE,
            remainder: total % CHUNK_SIZE,
        }
    }
}

/// EEPROM programmer driving one serial session.
///
/// Generic over the port type `P` so the whole orchestration can run against
/// a scripted port in tests.
pub struct Programmer<P: Port> {
    port: P,
    config: LinkConfig,
}

impl<P: Port> Programmer<P> {
    /// Create a programmer over an already opened port.
    pub fn new(port: P) -> Self {
        Self {
            port,
            config: LinkConfig::default(),
        }
    }

    /// Override the link tuning.
    #[must_use]
    pub fn with_config(mut self, config: LinkConfig) -> Self {
        self.config = config;
        self
    }

    /// Get a reference to the underlying port.
    pub fn port(&self) -> &P {
        &self.port
    }

    /// Get a mutable reference to the underlying port.
    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    /// Consume the programmer and return the underlying port.
    pub fn into_port(self) -> P {
        self.port
    }

    /// Write `data` to `chip`.
    ///
    /// `progress` receives `(completed_full_chunks, chunk_count)` after every
    /// full chunk; the remainder chunk is not reported separately. The first
    /// fatal chunk failure aborts the session, leaving the chip partially
    /// written.
    pub fn write_image<F>(&mut self, chip: Chip, data: &[u8], mut progress: F) -> Result<()>
    where
        F: FnMut(usize, usize),
    {
        let plan = TransferPlan::new(data.len());
        info!(
            "writing {} bytes to {} ({} chunks of {} bytes + {} remaining)",
            plan.total, chip, plan.chunk_count, CHUNK_SIZE, plan.remainder
        );

        self.handshake(Mode::Write, chip)?;

        let mut link = ChunkLink::with_config(&mut self.port, self.config.clone());
        let mut chunks = data.chunks_exact(CHUNK_SIZE);
        for (i, chunk) in chunks.by_ref().enumerate() {
            link.write_chunk(chunk)?;
            thread::sleep(PACING_DELAY);
            progress(i + 1, plan.chunk_count);
        }

        // The controller expects the trailing chunk even when it is empty.
        link.write_chunk(chunks.remainder())?;
        thread::sleep(PACING_DELAY);

        debug!("write session complete");
        Ok(())
    }

    /// Read `total` bytes from `chip` into `out`.
    ///
    /// Chunks are appended to `out` as they are verified, so an aborted
    /// session leaves the destination partially written. Progress reporting
    /// and abort behavior otherwise match [`Self::write_image`].
    pub fn read_image<W, F>(
        &mut self,
        chip: Chip,
        total: usize,
        out: &mut W,
        mut progress: F,
    ) -> Result<()>
    where
        W: std::io::Write,
        F: FnMut(usize, usize),
    {
        let plan = TransferPlan::new(total);
        info!(
            "reading {} bytes from {} ({} chunks of {} bytes + {} remaining)",
            plan.total, chip, plan.chunk_count, CHUNK_SIZE, plan.remainder
        );

        self.handshake(Mode::Read, chip)?;

        let mut link = ChunkLink::with_config(&mut self.port, self.config.clone());
        for i in 0..plan.chunk_count {
            let chunk = link.read_chunk(CHUNK_SIZE)?;
            out.write_all(&chunk)?;
            thread::sleep(PACING_DELAY);
            progress(i + 1, plan.chunk_count);
        }

        let chunk = link.read_chunk(plan.remainder)?;
        out.write_all(&chunk)?;
        thread::sleep(PACING_DELAY);

        debug!("read session complete");
        Ok(())
    }

    /// Run the reset/mode/chip-select handshake; a nack here is fatal.
    fn handshake(&mut self, mode: Mode, chip: Chip) -> Result<()> {
        let mut link = ChunkLink::with_config(&mut self.port, self.config.clone());
        link.handshake(mode, chip.wire_name())?;
        debug!("controller ready");
        Ok(())
    }

    /// Release the serial link.
    pub fn close(&mut self) -> Result<()> {
        self.port.close()
    }
}

impl Programmer<NativePort> {
    /// Open `port_name` at the fixed link baud rate and wait for the
    /// controller to settle.
    ///
    /// The port must already be present on the host; a missing port is
    /// reported as [`Error::PortNotFound`] before any open is attempted.
    pub fn open(port_name: &str) -> Result<Self> {
        if !crate::host::port_exists(port_name)? {
            return Err(Error::PortNotFound(port_name.to_string()));
        }

        let config = SerialConfig::new(port_name, wire::BAUD);
        let mut port = NativePort::open(&config)?;

        // The controller resets when the host opens the port; give it time
        // to boot, then drop anything it printed while doing so.
        thread::sleep(SETTLE_DELAY);
        if port.bytes_available()? > 0 {
            port.clear_buffers()?;
        }

        Ok(Self::new(port))
    }
}
