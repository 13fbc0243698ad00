//! Port abstraction for the serial link to the supervisory controller.
//!
//! The `Port` trait separates I/O from protocol logic: the transfer engine
//! only needs `Read + Write` plus timeout control, so it can run against the
//! real serial device or a scripted mock in tests.
//!
//! ```text
//! +------------------+
//! |  Protocol Layer  |
//! |  (link, wire)    |
//! +--------+---------+
//!          |
//!          v
//! +--------+---------+
//! |    Port Trait    |
//! +--------+---------+
//!          |
//!          v
//! +--------+---------+
//! | Native SerialPort|
//! |   (serialport)   |
//! +------------------+
//! ```

pub mod native;

use std::time::Duration;

use crate::error::Result;

/// Serial port configuration.
///
/// The link runs fixed at 8 data bits, no parity, one stop bit and no flow
/// control; only the name, baud rate and timeout vary.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Port name/path (e.g., "/dev/ttyUSB0", "COM3").
    pub port_name: String,
    /// Baud rate.
    pub baud_rate: u32,
    /// Read/write timeout.
    pub timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port_name: String::new(),
            baud_rate: crate::protocol::wire::BAUD,
            timeout: Duration::from_secs(3),
        }
    }
}

impl SerialConfig {
    /// Create a new configuration with port name and baud rate.
    pub fn new(port_name: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate,
            ..Default::default()
        }
    }

    /// Set the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Serial port information.
#[derive(Debug, Clone)]
pub struct PortInfo {
    /// Port name/path.
    pub name: String,
    /// Manufacturer string (if available).
    pub manufacturer: Option<String>,
    /// Product string (if available).
    pub product: Option<String>,
}

/// Unified port trait for the controller link.
pub trait Port: std::io::Read + std::io::Write + Send {
    /// Set the read/write timeout.
    fn set_timeout(&mut self, timeout: Duration) -> Result<()>;

    /// Get the current timeout.
    fn timeout(&self) -> Duration;

    /// Number of bytes queued for reading, without blocking.
    fn bytes_available(&mut self) -> Result<usize>;

    /// Clear input/output buffers.
    fn clear_buffers(&mut self) -> Result<()>;

    /// Get the port name/path.
    fn name(&self) -> &str;

    /// Close the port and release resources.
    ///
    /// Closing is idempotent; after the first call the port cannot be used
    /// for further I/O.
    fn close(&mut self) -> Result<()>;
}

/// Trait for listing available serial ports.
///
/// Separated from `Port` because enumeration is a static operation that
/// doesn't require an open port instance.
pub trait PortEnumerator {
    /// List all available serial ports.
    fn list_ports() -> Result<Vec<PortInfo>>;

    /// Check whether a named port is present on this host.
    fn port_exists(name: &str) -> Result<bool> {
        let ports = Self::list_ports()?;
        Ok(ports.iter().any(|p| p.name == name))
    }
}

pub use native::{NativePort, NativePortEnumerator};
