//! Supported EEPROM chips.
//!
//! The controller firmware addresses chips by name; the host only needs the
//! wire identifier and the capacity for pre-transfer validation.

use crate::error::Error;
use std::fmt;

/// Supported EEPROM chips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Chip {
    /// Microchip 24AA512 (512 Kbit I2C EEPROM).
    #[default]
    Aa24512,
}

impl Chip {
    /// Every chip the controller firmware knows how to drive.
    pub const ALL: &'static [Self] = &[Self::Aa24512];

    /// The identifier sent to the controller during the handshake.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Aa24512 => "24AA512",
        }
    }

    /// Usable capacity in bytes.
    pub fn capacity(&self) -> usize {
        match self {
            Self::Aa24512 => 64 * 1024,
        }
    }

    /// Look a chip up by name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "24aa512" => Some(Self::Aa24512),
            _ => None,
        }
    }
}

impl fmt::Display for Chip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl std::str::FromStr for Chip {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| Error::UnknownChip(s.to_string()))
    }
}
