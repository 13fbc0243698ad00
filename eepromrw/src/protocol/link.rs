//! Chunked transfer engine for the controller link.
//!
//! This module implements the three link-level primitives the transfer
//! protocol is built from:
//!
//! - the acknowledgement gate: wait for a 3-byte status token under a
//!   deadline,
//! - the handshake: reset the controller and select a direction and chip,
//! - the chunk exchange: move one chunk in either direction with checksum
//!   verification and bounded retry.
//!
//! The engine is generic over `Read + Write` so the protocol logic stays
//! I/O-agnostic and testable against a scripted mock.

use crate::error::{ChunkStage, Error, Result};
use crate::protocol::wire::{self, Mode, TOKEN_LEN, token};
use log::{debug, trace, warn};
use std::io::{Read, Write};
use std::time::{Duration, Instant};

/// Tunable deadlines and bounds for one link.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Deadline for a 3-byte status token.
    pub status_timeout: Duration,
    /// Deadline for bulk payload and checksum reads.
    pub read_timeout: Duration,
    /// Attempts allowed per chunk before a failing checksum exchange is
    /// given up.
    pub max_chunk_retries: u32,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            status_timeout: Duration::from_secs(3),
            read_timeout: Duration::from_secs(3),
            max_chunk_retries: 10,
        }
    }
}

/// Outcome of one status-token wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The controller confirmed the previous step.
    Acked,
    /// The controller rejected the previous step.
    Nacked,
}

/// Chunk transfer engine over an open byte stream.
pub struct ChunkLink<'a, P: Read + Write> {
    port: &'a mut P,
    config: LinkConfig,
}

impl<'a, P: Read + Write> ChunkLink<'a, P> {
    /// Create a link with default tuning.
    pub fn new(port: &'a mut P) -> Self {
        Self {
            port,
            config: LinkConfig::default(),
        }
    }

    /// Create a link with custom tuning.
    pub fn with_config(port: &'a mut P, config: LinkConfig) -> Self {
        Self { port, config }
    }

    /// Read into `buf` until it is full or `deadline` passes.
    ///
    /// Returns the number of bytes actually filled; the caller decides
    /// whether a short count is a timeout or missing data.
    fn read_up_to_deadline(&mut self, buf: &mut [u8], deadline: Instant) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.port.read(&mut buf[filled..]) {
                Ok(0) => {
                    if Instant::now() >= deadline {
                        break;
                    }
                },
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                    if Instant::now() >= deadline {
                        break;
                    }
                },
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {},
                Err(e) => return Err(Error::Io(e)),
            }
        }
        Ok(filled)
    }

    /// Wait for the controller's 3-byte status token.
    ///
    /// Blocks until the full token arrives or `status_timeout` elapses; a
    /// silent controller yields [`Error::Timeout`] rather than hanging.
    /// Any token other than `ack` counts as a nack.
    pub fn read_status(&mut self) -> Result<Status> {
        let deadline = Instant::now() + self.config.status_timeout;
        let mut buf = [0u8; TOKEN_LEN];
        let n = self.read_up_to_deadline(&mut buf, deadline)?;
        if n < TOKEN_LEN {
            return Err(Error::Timeout(format!(
                "status token: {n}/{TOKEN_LEN} bytes within {:?}",
                self.config.status_timeout
            )));
        }
        if &buf == token::ACK {
            trace!("ack");
            Ok(Status::Acked)
        } else {
            trace!("nack: {buf:02X?}");
            Ok(Status::Nacked)
        }
    }

    /// Wait for a status token, treating a nack at `stage` as fatal.
    fn require_ack(&mut self, stage: ChunkStage) -> Result<()> {
        match self.read_status()? {
            Status::Acked => Ok(()),
            Status::Nacked => Err(Error::ChunkRejected(stage)),
        }
    }

    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.port.write_all(bytes)?;
        self.port.flush()?;
        Ok(())
    }

    /// Reset the controller and put it into `mode` for `chip`.
    ///
    /// The reset, mode and chip-select commands go out with no status wait
    /// in between; the controller answers with a single token. A nack is
    /// fatal for the whole session and is never retried.
    pub fn handshake(&mut self, mode: Mode, chip: &str) -> Result<()> {
        debug!("handshake: {mode:?} mode, chip {chip}");
        self.send(&wire::handshake_frame(mode, chip))?;
        match self.read_status()? {
            Status::Acked => Ok(()),
            Status::Nacked => Err(Error::HandshakeRejected),
        }
    }

    /// Send one chunk: announce, size, payload, checksum.
    ///
    /// A nack at the announce, size or payload step aborts the session; a
    /// nacked checksum restarts the whole exchange with the same bytes, up
    /// to `max_chunk_retries` attempts.
    #[allow(clippy::cast_possible_truncation)] // chunk length <= CHUNK_SIZE
    pub fn write_chunk(&mut self, data: &[u8]) -> Result<()> {
        debug_assert!(data.len() <= wire::CHUNK_SIZE);
        let sum = wire::checksum(data);

        for attempt in 1..=self.config.max_chunk_retries {
            self.send(token::CHUNK)?;
            self.require_ack(ChunkStage::Announce)?;

            self.send(&wire::size_field(data.len() as u16))?;
            self.require_ack(ChunkStage::Size)?;

            self.send(data)?;
            self.require_ack(ChunkStage::Payload)?;

            self.send(&wire::checksum_field(sum))?;
            match self.read_status()? {
                Status::Acked => return Ok(()),
                Status::Nacked => {
                    warn!(
                        "checksum rejected, resending chunk (attempt {attempt}/{})",
                        self.config.max_chunk_retries
                    );
                },
            }
        }

        Err(Error::RetryExhausted {
            attempts: self.config.max_chunk_retries,
        })
    }

    /// Receive one chunk of exactly `size` bytes.
    ///
    /// The controller's checksum arrives ahead of the payload. A local
    /// mismatch is answered with `nck` and the exchange restarts; a payload
    /// that stays short despite a matching checksum is answered with `nck`
    /// and aborts the session as missing data.
    #[allow(clippy::cast_possible_truncation)] // chunk length <= CHUNK_SIZE
    pub fn read_chunk(&mut self, size: usize) -> Result<Vec<u8>> {
        debug_assert!(size <= wire::CHUNK_SIZE);

        for attempt in 1..=self.config.max_chunk_retries {
            self.send(token::CHUNK)?;
            self.require_ack(ChunkStage::Announce)?;

            self.send(&wire::size_field(size as u16))?;
            self.require_ack(ChunkStage::Size)?;

            let mut raw_sum = [0u8; 4];
            let deadline = Instant::now() + self.config.read_timeout;
            let n = self.read_up_to_deadline(&mut raw_sum, deadline)?;
            if n < raw_sum.len() {
                return Err(Error::Timeout(format!("chunk checksum: {n}/4 bytes")));
            }
            let remote = wire::decode_checksum(raw_sum);

            let mut payload = vec![0u8; size];
            let deadline = Instant::now() + self.config.read_timeout;
            let received = self.read_up_to_deadline(&mut payload, deadline)?;

            let local = wire::checksum(&payload[..received]);
            if local != remote {
                warn!(
                    "checksum mismatch (local {local}, remote {remote}), \
                     rerequesting chunk (attempt {attempt}/{})",
                    self.config.max_chunk_retries
                );
                self.send(token::NACK)?;
                continue;
            }

            if received < size {
                self.send(token::NACK)?;
                return Err(Error::ShortRead {
                    expected: size,
                    actual: received,
                });
            }

            self.send(token::ACK)?;
            return Ok(payload);
        }

        Err(Error::RetryExhausted {
            attempts: self.config.max_chunk_retries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Mock serial port with separate read/write buffers.
    ///
    /// Unlike `Cursor<Vec<u8>>`, this keeps reads and writes independent;
    /// an empty read buffer behaves like a serial timeout.
    struct MockSerial {
        read_buf: std::collections::VecDeque<u8>,
        write_buf: Vec<u8>,
    }

    impl MockSerial {
        fn new(response: &[u8]) -> Self {
            Self {
                read_buf: response.iter().copied().collect(),
                write_buf: Vec::new(),
            }
        }
    }

    impl std::io::Read for MockSerial {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.read_buf.is_empty() {
                return Err(std::io::Error::new(std::io::ErrorKind::TimedOut, "no data"));
            }
            let n = buf.len().min(self.read_buf.len());
            for b in buf.iter_mut().take(n) {
                *b = self.read_buf.pop_front().unwrap();
            }
            Ok(n)
        }
    }

    impl std::io::Write for MockSerial {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.write_buf.extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn fast_config(max_chunk_retries: u32) -> LinkConfig {
        LinkConfig {
            status_timeout: Duration::from_millis(50),
            read_timeout: Duration::from_millis(50),
            max_chunk_retries,
        }
    }

    /// The expected wire bytes of one write-chunk exchange.
    fn write_exchange_bytes(data: &[u8]) -> Vec<u8> {
        let mut expected = Vec::new();
        expected.extend_from_slice(token::CHUNK);
        expected.extend_from_slice(&wire::size_field(data.len() as u16));
        expected.extend_from_slice(data);
        expected.extend_from_slice(&wire::checksum_field(wire::checksum(data)));
        expected
    }

    #[test]
    fn test_handshake_write_mode_wire_bytes() {
        let mut port = MockSerial::new(b"ack");
        let mut link = ChunkLink::with_config(&mut port, fast_config(1));

        link.handshake(Mode::Write, "24AA512").unwrap();
        assert_eq!(port.write_buf, b"rstwrt24AA512;");
    }

    #[test]
    fn test_handshake_nack_is_fatal() {
        let mut port = MockSerial::new(b"nck");
        let mut link = ChunkLink::with_config(&mut port, fast_config(1));

        let err = link.handshake(Mode::Read, "24AA512").unwrap_err();
        assert!(matches!(err, Error::HandshakeRejected));
        // Nothing beyond the handshake frame may have been sent.
        assert_eq!(port.write_buf, b"rstrd 24AA512;");
    }

    #[test]
    fn test_read_status_times_out_on_silent_controller() {
        let mut port = MockSerial::new(b"");
        let mut link = ChunkLink::with_config(&mut port, fast_config(1));

        let err = link.read_status().unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
    }

    #[test]
    fn test_read_status_partial_token_times_out() {
        let mut port = MockSerial::new(b"ac");
        let mut link = ChunkLink::with_config(&mut port, fast_config(1));

        let err = link.read_status().unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
    }

    #[test]
    fn test_write_chunk_happy_path() {
        let data = [0x11u8; 16];
        let mut port = MockSerial::new(b"ackackackack");
        let mut link = ChunkLink::with_config(&mut port, fast_config(1));

        link.write_chunk(&data).unwrap();
        assert_eq!(port.write_buf, write_exchange_bytes(&data));
    }

    #[test]
    fn test_write_chunk_checksum_nack_retries_whole_exchange() {
        let data = [0xABu8; 16];
        // First attempt: three acks, then the checksum is nacked.
        // Second attempt: all four acks.
        let mut response = Vec::new();
        response.extend_from_slice(b"ackackacknck");
        response.extend_from_slice(b"ackackackack");

        let mut port = MockSerial::new(&response);
        let mut link = ChunkLink::with_config(&mut port, fast_config(3));

        link.write_chunk(&data).unwrap();

        let one = write_exchange_bytes(&data);
        let mut twice = one.clone();
        twice.extend_from_slice(&one);
        assert_eq!(port.write_buf, twice);
    }

    #[test]
    fn test_write_chunk_announce_nack_is_fatal() {
        let mut port = MockSerial::new(b"nck");
        let mut link = ChunkLink::with_config(&mut port, fast_config(3));

        let err = link.write_chunk(&[0u8; 16]).unwrap_err();
        assert!(matches!(
            err,
            Error::ChunkRejected(ChunkStage::Announce)
        ));
        // No retry: only the announcement went out.
        assert_eq!(port.write_buf, token::CHUNK);
    }

    #[test]
    fn test_write_chunk_size_nack_is_fatal() {
        let mut port = MockSerial::new(b"acknck");
        let mut link = ChunkLink::with_config(&mut port, fast_config(3));

        let err = link.write_chunk(&[0u8; 16]).unwrap_err();
        assert!(matches!(err, Error::ChunkRejected(ChunkStage::Size)));
    }

    #[test]
    fn test_write_chunk_payload_nack_is_fatal() {
        let mut port = MockSerial::new(b"ackacknck");
        let mut link = ChunkLink::with_config(&mut port, fast_config(3));

        let err = link.write_chunk(&[0u8; 16]).unwrap_err();
        assert!(matches!(
            err,
            Error::ChunkRejected(ChunkStage::Payload)
        ));
    }

    #[test]
    fn test_write_chunk_retries_are_bounded() {
        // The controller nacks every checksum; two attempts are allowed.
        let mut response = Vec::new();
        response.extend_from_slice(b"ackackacknck");
        response.extend_from_slice(b"ackackacknck");

        let mut port = MockSerial::new(&response);
        let mut link = ChunkLink::with_config(&mut port, fast_config(2));

        let err = link.write_chunk(&[0x42u8; 16]).unwrap_err();
        assert!(matches!(err, Error::RetryExhausted { attempts: 2 }));
    }

    #[test]
    fn test_write_empty_remainder_chunk() {
        let mut port = MockSerial::new(b"ackackackack");
        let mut link = ChunkLink::with_config(&mut port, fast_config(1));

        link.write_chunk(&[]).unwrap();
        // Size field zero, no payload bytes, checksum zero.
        assert_eq!(port.write_buf, write_exchange_bytes(&[]));
    }

    #[test]
    fn test_read_chunk_happy_path() {
        let payload: Vec<u8> = (0u8..16).collect();
        let mut response = Vec::new();
        response.extend_from_slice(b"ackack");
        response.extend_from_slice(&wire::checksum_field(wire::checksum(&payload)));
        response.extend_from_slice(&payload);

        let mut port = MockSerial::new(&response);
        let mut link = ChunkLink::with_config(&mut port, fast_config(1));

        let got = link.read_chunk(16).unwrap();
        assert_eq!(got, payload);

        // Host side: announce, size request, final ack.
        let mut expected = Vec::new();
        expected.extend_from_slice(token::CHUNK);
        expected.extend_from_slice(&wire::size_field(16));
        expected.extend_from_slice(token::ACK);
        assert_eq!(port.write_buf, expected);
    }

    #[test]
    fn test_read_chunk_checksum_mismatch_retries() {
        let payload = [0x5Au8; 16];
        let mut response = Vec::new();
        // First attempt: advertised checksum is wrong.
        response.extend_from_slice(b"ackack");
        response.extend_from_slice(&wire::checksum_field(wire::checksum(&payload) + 1));
        response.extend_from_slice(&payload);
        // Second attempt succeeds.
        response.extend_from_slice(b"ackack");
        response.extend_from_slice(&wire::checksum_field(wire::checksum(&payload)));
        response.extend_from_slice(&payload);

        let mut port = MockSerial::new(&response);
        let mut link = ChunkLink::with_config(&mut port, fast_config(3));

        let got = link.read_chunk(16).unwrap();
        assert_eq!(got, payload);

        // nck after the mismatch, ack after the good exchange.
        let mut expected = Vec::new();
        expected.extend_from_slice(token::CHUNK);
        expected.extend_from_slice(&wire::size_field(16));
        expected.extend_from_slice(token::NACK);
        expected.extend_from_slice(token::CHUNK);
        expected.extend_from_slice(&wire::size_field(16));
        expected.extend_from_slice(token::ACK);
        assert_eq!(port.write_buf, expected);
    }

    #[test]
    fn test_read_chunk_short_payload_is_missing_data() {
        // Ten bytes arrive instead of sixteen, but their checksum matches
        // what the controller advertised, so this is data loss rather than
        // corruption.
        let partial = [0x07u8; 10];
        let mut response = Vec::new();
        response.extend_from_slice(b"ackack");
        response.extend_from_slice(&wire::checksum_field(wire::checksum(&partial)));
        response.extend_from_slice(&partial);

        let mut port = MockSerial::new(&response);
        let mut link = ChunkLink::with_config(&mut port, fast_config(3));

        let err = link.read_chunk(16).unwrap_err();
        assert!(matches!(
            err,
            Error::ShortRead {
                expected: 16,
                actual: 10
            }
        ));
        // The short exchange was nacked, not retried.
        assert!(port.write_buf.ends_with(token::NACK));
    }

    #[test]
    fn test_read_chunk_zero_size() {
        let mut response = Vec::new();
        response.extend_from_slice(b"ackack");
        response.extend_from_slice(&wire::checksum_field(0));

        let mut port = MockSerial::new(&response);
        let mut link = ChunkLink::with_config(&mut port, fast_config(1));

        let got = link.read_chunk(0).unwrap();
        assert!(got.is_empty());
        assert!(port.write_buf.ends_with(token::ACK));
    }

    #[test]
    fn test_read_chunk_persistent_mismatch_exhausts_retries() {
        let payload = [0x33u8; 16];
        let mut response = Vec::new();
        for _ in 0..2 {
            response.extend_from_slice(b"ackack");
            response.extend_from_slice(&wire::checksum_field(wire::checksum(&payload) + 1));
            response.extend_from_slice(&payload);
        }

        let mut port = MockSerial::new(&response);
        let mut link = ChunkLink::with_config(&mut port, fast_config(2));

        let err = link.read_chunk(16).unwrap_err();
        assert!(matches!(err, Error::RetryExhausted { attempts: 2 }));
    }
}
