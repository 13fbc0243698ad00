//! Wire-level constants and field encoding for the controller link.
//!
//! Everything on the wire is either a raw 3-byte ASCII token or a fixed-width
//! little-endian integer; there is no framing beyond these fixed lengths.
//!
//! ## One write-chunk exchange
//!
//! ```text
//! host -> dev   chk                    announce chunk
//! dev  -> host  ack
//! host -> dev   <u16 LE>               chunk length
//! dev  -> host  ack
//! host -> dev   <payload>              up to 16 raw bytes
//! dev  -> host  ack
//! host -> dev   <u32 LE>               additive checksum
//! dev  -> host  ack / nck              nck restarts the exchange
//! ```

use byteorder::{LittleEndian, WriteBytesExt};

/// Fixed number of payload bytes in a full chunk.
pub const CHUNK_SIZE: usize = 16;

/// Fixed baud rate of the controller link.
pub const BAUD: u32 = 115_200;

/// Length of every command and status token.
pub const TOKEN_LEN: usize = 3;

/// 3-byte command and status tokens exchanged with the controller.
pub mod token {
    /// Reset controller session state.
    pub const RESET: &[u8; 3] = b"rst";
    /// Select write-to-chip mode.
    pub const MODE_WRITE: &[u8; 3] = b"wrt";
    /// Select read-from-chip mode; the trailing space keeps the token 3 bytes.
    pub const MODE_READ: &[u8; 3] = b"rd ";
    /// Announce one chunk exchange.
    pub const CHUNK: &[u8; 3] = b"chk";
    /// Positive status.
    pub const ACK: &[u8; 3] = b"ack";
    /// Negative status.
    pub const NACK: &[u8; 3] = b"nck";
    /// Terminator following the chip identifier.
    pub const TARGET_END: u8 = b';';
}

/// Transfer direction selected during the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Host sends the image to the chip.
    Write,
    /// Host receives the image from the chip.
    Read,
}

impl Mode {
    /// The 3-byte mode command for this direction.
    pub fn token(self) -> &'static [u8; 3] {
        match self {
            Self::Write => token::MODE_WRITE,
            Self::Read => token::MODE_READ,
        }
    }
}

/// Additive checksum over a chunk: sum of byte values mod 256.
///
/// The wire carries it as a 4-byte little-endian field even though only the
/// low byte can ever be non-zero; the width is kept for compatibility with
/// the controller firmware.
pub fn checksum(data: &[u8]) -> u32 {
    data.iter().map(|&b| u32::from(b)).sum::<u32>() % 256
}

/// Build the reset/mode/chip-select handshake bytes.
///
/// The three commands go out back to back with no status wait in between;
/// the controller answers once, after the chip selector is parsed.
pub fn handshake_frame(mode: Mode, chip: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(2 * TOKEN_LEN + chip.len() + 1);
    buf.extend_from_slice(token::RESET);
    buf.extend_from_slice(mode.token());
    buf.extend_from_slice(chip.as_bytes());
    buf.push(token::TARGET_END);
    buf
}

/// Encode the chunk length as its 2-byte little-endian wire field.
#[allow(clippy::unwrap_used)] // Writing to Vec<u8> cannot fail
pub fn size_field(len: u16) -> Vec<u8> {
    let mut buf = Vec::with_capacity(2);
    buf.write_u16::<LittleEndian>(len).unwrap();
    buf
}

/// Encode a checksum as its 4-byte little-endian wire field.
#[allow(clippy::unwrap_used)] // Writing to Vec<u8> cannot fail
pub fn checksum_field(sum: u32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(4);
    buf.write_u32::<LittleEndian>(sum).unwrap();
    buf
}

/// Decode the 4-byte little-endian checksum field.
pub fn decode_checksum(raw: [u8; 4]) -> u32 {
    u32::from_le_bytes(raw)
}
