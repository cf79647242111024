//! Wire format encoding and decoding.
//!
//! Implements the 16-byte header format:
//! ```text
//! ┌────────┬───────┬────────┬────────────┬─────────────┐
//! │ Magic  │ Flags │ Status │ Request ID │ Body length │
//! │ 2 bytes│ 1 byte│ 1 byte │ 8 bytes    │ 4 bytes     │
//! │ 0xdabb │       │        │ uint64 BE  │ uint32 BE   │
//! └────────┴───────┴────────┴────────────┴─────────────┘
//! ```
//!
//! All multi-byte integers are Big Endian.

use crate::error::{FrameError, Result};

/// Header size in bytes (fixed, exactly 16).
pub const HEADER_SIZE: usize = 16;

/// Protocol magic constant.
pub const MAGIC: u16 = 0xdabb;

/// Response status denoting success.
pub const STATUS_OK: u8 = 20;

/// Flag constants for the protocol.
pub mod flags {
    /// Request bit: request (1) or response (0).
    pub const REQUEST: u8 = 0b1000_0000;
    /// Two-way bit: a response is expected.
    pub const TWO_WAY: u8 = 0b0100_0000;
    /// Mask for the serialization-scheme id in the low bits.
    pub const SERIALIZATION_MASK: u8 = 0b0001_1111;
    /// Serialization-scheme id for fastjson (JSON bodies).
    pub const SERIALIZATION_FASTJSON: u8 = 6;

    /// Flags for an outbound two-way request with JSON bodies.
    pub const TWO_WAY_REQUEST: u8 = REQUEST | TWO_WAY | SERIALIZATION_FASTJSON;

    /// Check if a specific flag is set.
    #[inline]
    pub fn has_flag(flags: u8, flag: u8) -> bool {
        flags & flag != 0
    }
}

/// Decoded header from wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Flags byte (see [`flags`]).
    pub flags: u8,
    /// Status byte (0 for requests; [`STATUS_OK`] or an error code for responses).
    pub status: u8,
    /// Request identifier, unique per client while the call is pending.
    pub request_id: u64,
    /// Body length in bytes following the header.
    pub body_length: u32,
}

impl Header {
    /// Create a request header (status 0, request + two-way flags).
    pub fn request(request_id: u64, body_length: u32) -> Self {
        Self {
            flags: flags::TWO_WAY_REQUEST,
            status: 0,
            request_id,
            body_length,
        }
    }

    /// Create a response header with the given status.
    pub fn response(status: u8, request_id: u64, body_length: u32) -> Self {
        Self {
            flags: flags::SERIALIZATION_FASTJSON,
            status,
            request_id,
            body_length,
        }
    }

    /// Encode header to bytes (Big Endian), magic included.
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..2].copy_from_slice(&MAGIC.to_be_bytes());
        buf[2] = self.flags;
        buf[3] = self.status;
        buf[4..12].copy_from_slice(&self.request_id.to_be_bytes());
        buf[12..16].copy_from_slice(&self.body_length.to_be_bytes());
        buf
    }

    /// Decode header from bytes (Big Endian).
    ///
    /// Fails with [`FrameError::Incomplete`] on a short buffer and
    /// [`FrameError::InvalidMagic`] when the magic does not match.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(FrameError::Incomplete {
                available: buf.len(),
                needed: HEADER_SIZE,
            }
            .into());
        }
        let magic = u16::from_be_bytes([buf[0], buf[1]]);
        if magic != MAGIC {
            return Err(FrameError::InvalidMagic { found: magic }.into());
        }
        Ok(Self {
            flags: buf[2],
            status: buf[3],
            request_id: u64::from_be_bytes([
                buf[4], buf[5], buf[6], buf[7], buf[8], buf[9], buf[10], buf[11],
            ]),
            body_length: u32::from_be_bytes([buf[12], buf[13], buf[14], buf[15]]),
        })
    }

    /// Check if this is a request header.
    #[inline]
    pub fn is_request(&self) -> bool {
        flags::has_flag(self.flags, flags::REQUEST)
    }

    /// Check if this is a response header.
    #[inline]
    pub fn is_response(&self) -> bool {
        !self.is_request()
    }

    /// Check if the two-way bit is set.
    #[inline]
    pub fn is_two_way(&self) -> bool {
        flags::has_flag(self.flags, flags::TWO_WAY)
    }

    /// Check if this is a successful response.
    #[inline]
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }

    /// The serialization-scheme id packed into the low flag bits.
    #[inline]
    pub fn serialization_id(&self) -> u8 {
        self.flags & flags::SERIALIZATION_MASK
    }
}
