//! Host-side utilities for serial port discovery.

use crate::error::Result;
use crate::port::{NativePortEnumerator, PortEnumerator, PortInfo};

/// Discover all serial ports visible on this host.
pub fn discover_ports() -> Result<Vec<PortInfo>> {
    NativePortEnumerator::list_ports()
}

/// Check whether a named serial port is present.
pub fn port_exists(name: &str) -> Result<bool> {
    NativePortEnumerator::port_exists(name)
}
