//! Frame struct with typed accessors.
//!
//! Represents a complete protocol frame with header and payload.
//! Uses `bytes::Bytes` for zero-copy payload sharing.

use bytes::Bytes;

use super::wire_format::{Header, HEADER_SIZE};

/// A complete protocol frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Decoded header.
    pub header: Header,
    /// Payload bytes (zero-copy via `bytes::Bytes`).
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame from header and payload.
    pub fn new(header: Header, payload: Bytes) -> Self {
        Self { header, payload }
    }

    /// Get a reference to the payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Get the request ID.
    #[inline]
    pub fn request_id(&self) -> u64 {
        self.header.request_id
    }

    /// Get the status byte.
    #[inline]
    pub fn status(&self) -> u8 {
        self.header.status
    }

    /// Check if this is a response frame.
    #[inline]
    pub fn is_response(&self) -> bool {
        self.header.is_response()
    }

    /// Check if this is a successful response.
    #[inline]
    pub fn is_ok(&self) -> bool {
        self.header.is_ok()
    }
}

/// Build a complete frame as a single byte vector.
///
/// Encodes the header and appends the body into a contiguous buffer so the
/// whole frame can go out in one write.
pub fn build_frame(header: &Header, body: &[u8]) -> Vec<u8> {
    debug_assert_eq!(header.body_length as usize, body.len());
    let mut buf = Vec::with_capacity(HEADER_SIZE + body.len());
    buf.extend_from_slice(&header.encode());
    buf.extend_from_slice(body);
    buf
}
