// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 weft.dev

//! Transport message header.
//!
//! Every message starts with a fixed 16-byte header; the method ordinal in
//! it selects the payload type, and the payload itself begins at byte 16.
//! Schema offsets are payload-relative, so decoding runs over
//! `bytes[HEADER_SIZE..]`.

use std::error::Error;
use std::fmt;

/// Bytes occupied by the header at the front of every message.
pub const HEADER_SIZE: usize = 16;

/// Magic number of the wire format revision this crate decodes.
pub const MAGIC_CURRENT: u8 = 1;

/// Which of a method's two payloads a message carries.
///
/// The wire does not say; the capture context does. Callers pass the
/// direction alongside the bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Request,
    Response,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderError {
    /// Fewer than [`HEADER_SIZE`] bytes of input.
    TooShort { actual: usize },
}

impl fmt::Display for HeaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort { actual } => write!(
                f,
                "message too short for a header: {} bytes, need {}",
                actual, HEADER_SIZE
            ),
        }
    }
}

impl Error for HeaderError {}

/// Parsed transport header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MessageHeader {
    /// Transaction id pairing a response with its request. Zero for events.
    pub txid: u32,
    pub flags: [u8; 3],
    pub magic: u8,
    /// Method ordinal, the dispatch key into the schema catalog.
    pub ordinal: u64,
}

impl MessageHeader {
    /// Parse the first [`HEADER_SIZE`] bytes of a message. Trailing payload
    /// bytes are ignored here.
    ///
    /// A wrong magic number is not a parse error; callers decide through
    /// [`MessageHeader::is_supported`] whether to keep going.
    pub fn parse(bytes: &[u8]) -> Result<MessageHeader, HeaderError> {
        if bytes.len() < HEADER_SIZE {
            return Err(HeaderError::TooShort { actual: bytes.len() });
        }
        let txid = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let flags = [bytes[4], bytes[5], bytes[6]];
        let magic = bytes[7];
        let ordinal = u64::from_le_bytes([
            bytes[8], bytes[9], bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15],
        ]);
        Ok(MessageHeader {
            txid,
            flags,
            magic,
            ordinal,
        })
    }

    /// Check if this header carries the wire format revision this crate
    /// understands.
    pub fn is_supported(&self) -> bool {
        self.magic == MAGIC_CURRENT
    }
}

impl fmt::Display for MessageHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "txid={:08x} magic={:02x} ordinal={:016x}",
            self.txid, self.magic, self.ordinal
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_reads_little_endian_fields() {
        let bytes = [
            0x04, 0x03, 0x02, 0x01, // txid
            0xaa, 0xbb, 0xcc, // flags
            0x01, // magic
            0xef, 0xcd, 0xab, 0x89, 0x67, 0x45, 0x23, 0x01, // ordinal
        ];
        let header = MessageHeader::parse(&bytes).expect("header");
        assert_eq!(header.txid, 0x0102_0304);
        assert_eq!(header.flags, [0xaa, 0xbb, 0xcc]);
        assert_eq!(header.magic, 1);
        assert!(header.is_supported());
        assert_eq!(header.ordinal, 0x0123_4567_89ab_cdef);
    }

    #[test]
    fn short_input_is_rejected() {
        let error = MessageHeader::parse(&[0u8; 15]).expect_err("too short");
        assert_eq!(error, HeaderError::TooShort { actual: 15 });
        assert!(error.to_string().contains("15 bytes"));
    }

    #[test]
    fn payload_bytes_after_the_header_are_ignored() {
        let mut bytes = [0u8; 64];
        bytes[7] = MAGIC_CURRENT;
        bytes[8] = 9;
        let header = MessageHeader::parse(&bytes).expect("header");
        assert_eq!(header.ordinal, 9);
    }

    #[test]
    fn wrong_magic_parses_but_is_unsupported() {
        let bytes = [0u8; HEADER_SIZE];
        let header = MessageHeader::parse(&bytes).expect("header");
        assert!(!header.is_supported());
    }

    #[test]
    fn display_shows_dispatch_fields() {
        let header = MessageHeader {
            txid: 1,
            flags: [0; 3],
            magic: MAGIC_CURRENT,
            ordinal: 0xdead,
        };
        assert_eq!(
            header.to_string(),
            "txid=00000001 magic=01 ordinal=000000000000dead"
        );
    }
}
