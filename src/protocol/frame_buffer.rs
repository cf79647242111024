//! Receive accumulator for extracting frames from partial reads.
//!
//! Every inbound chunk is appended to a single `BytesMut` buffer; after each
//! append the buffer yields as many complete frames as it holds. A frame is
//! extractable only once `available >= 16 + declared body length`. Anything
//! less is a normal wait state, never an error.

use bytes::{Bytes, BytesMut};

use super::frame::Frame;
use super::wire_format::{Header, HEADER_SIZE};
use crate::error::{DubboError, FrameError, Result};

/// State machine for frame parsing.
#[derive(Debug, Clone)]
enum State {
    /// Waiting for a complete header (need 16 bytes).
    WaitingForHeader,
    /// Header parsed, waiting for body bytes.
    WaitingForBody { header: Header },
}

/// Buffer for accumulating inbound bytes and extracting complete frames.
pub struct FrameBuffer {
    /// Accumulated bytes from socket reads.
    buffer: BytesMut,
    /// Current parsing state.
    state: State,
    /// Maximum accepted body length.
    max_body_size: u32,
}

impl FrameBuffer {
    /// Create a new frame buffer with the given body-size limit.
    pub fn new(max_body_size: u32) -> Self {
        Self {
            buffer: BytesMut::with_capacity(64 * 1024),
            state: State::WaitingForHeader,
            max_body_size,
        }
    }

    /// Push data into the buffer and extract all complete frames.
    ///
    /// Returns every frame completed by this chunk (possibly none). Partial
    /// data stays buffered for the next push.
    ///
    /// # Errors
    ///
    /// Fails on wrong magic or a declared body length above the limit; both
    /// are fatal to the connection feeding this buffer.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Frame>> {
        self.buffer.extend_from_slice(data);

        let mut frames = Vec::new();
        while let Some(frame) = self.try_extract_one()? {
            frames.push(frame);
        }
        Ok(frames)
    }

    /// Try to extract a single frame from the buffer.
    fn try_extract_one(&mut self) -> Result<Option<Frame>> {
        match &self.state {
            State::WaitingForHeader => {
                let header = match Header::decode(&self.buffer) {
                    Ok(header) => header,
                    Err(DubboError::Frame(FrameError::Incomplete { .. })) => return Ok(None),
                    Err(e) => return Err(e),
                };

                if header.body_length > self.max_body_size {
                    return Err(DubboError::BodyTooLarge {
                        size: header.body_length,
                        max: self.max_body_size,
                    });
                }

                let _ = self.buffer.split_to(HEADER_SIZE);

                if header.body_length == 0 {
                    return Ok(Some(Frame::new(header, Bytes::new())));
                }

                self.state = State::WaitingForBody { header };
                self.try_extract_one()
            }

            State::WaitingForBody { header } => {
                let body_len = header.body_length as usize;
                if self.buffer.len() < body_len {
                    return Ok(None);
                }

                let payload = self.buffer.split_to(body_len).freeze();
                let header = *header;
                self.state = State::WaitingForHeader;

                Ok(Some(Frame::new(header, payload)))
            }
        }
    }

    /// Get the number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MAX_BODY_SIZE;
    use crate::protocol::frame::build_frame;
    use crate::protocol::wire_format::STATUS_OK;

    fn buffer() -> FrameBuffer {
        FrameBuffer::new(DEFAULT_MAX_BODY_SIZE)
    }

    fn make_response_bytes(request_id: u64, body: &[u8]) -> Vec<u8> {
        let header = Header::response(STATUS_OK, request_id, body.len() as u32);
        build_frame(&header, body)
    }

    #[test]
    fn test_single_complete_frame() {
        let mut buffer = buffer();
        let frames = buffer.push(&make_response_bytes(42, b"hello")).unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].request_id(), 42);
        assert_eq!(frames[0].payload(), b"hello");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_multiple_frames_in_one_push() {
        let mut buffer = buffer();
        let mut combined = Vec::new();
        combined.extend_from_slice(&make_response_bytes(1, b"first"));
        combined.extend_from_slice(&make_response_bytes(2, b"second"));
        combined.extend_from_slice(&make_response_bytes(3, b"third"));

        let frames = buffer.push(&combined).unwrap();

        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].request_id(), 1);
        assert_eq!(frames[1].request_id(), 2);
        assert_eq!(frames[2].request_id(), 3);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_fragmented_header() {
        let mut buffer = buffer();
        let bytes = make_response_bytes(42, b"test");

        let frames = buffer.push(&bytes[..5]).unwrap();
        assert!(frames.is_empty());

        let frames = buffer.push(&bytes[5..]).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].request_id(), 42);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_fragmented_body() {
        let mut buffer = buffer();
        let body = b"this is a longer body that will be fragmented";
        let bytes = make_response_bytes(42, body);

        let partial = HEADER_SIZE + 10;
        let frames = buffer.push(&bytes[..partial]).unwrap();
        assert!(frames.is_empty());

        let frames = buffer.push(&bytes[partial..]).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload(), body);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_byte_at_a_time() {
        let mut buffer = buffer();
        let bytes = make_response_bytes(42, b"hi");

        let mut all_frames = Vec::new();
        for byte in &bytes {
            all_frames.extend(buffer.push(&[*byte]).unwrap());
        }

        assert_eq!(all_frames.len(), 1);
        assert_eq!(all_frames[0].payload(), b"hi");
    }

    #[test]
    fn test_empty_body() {
        let mut buffer = buffer();
        let frames = buffer.push(&make_response_bytes(42, b"")).unwrap();

        assert_eq!(frames.len(), 1);
        assert!(frames[0].payload.is_empty());
    }

    #[test]
    fn test_invalid_magic_is_fatal() {
        let mut buffer = buffer();
        let mut bytes = make_response_bytes(42, b"hello");
        bytes[0] = 0x00;

        let result = buffer.push(&bytes);
        assert!(matches!(
            result,
            Err(DubboError::Frame(FrameError::InvalidMagic { .. }))
        ));
    }

    #[test]
    fn test_body_size_limit() {
        let mut buffer = FrameBuffer::new(100);
        let header = Header::response(STATUS_OK, 42, 1000);

        let result = buffer.push(&header.encode());
        assert!(matches!(
            result,
            Err(DubboError::BodyTooLarge { size: 1000, max: 100 })
        ));
    }

    #[test]
    fn test_mixed_complete_and_partial() {
        let mut buffer = buffer();
        let frame1 = make_response_bytes(1, b"first");
        let frame2 = make_response_bytes(2, b"second");

        let mut data = frame1.clone();
        data.extend_from_slice(&frame2[..5]);

        let frames = buffer.push(&data).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].request_id(), 1);

        let frames = buffer.push(&frame2[5..]).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].request_id(), 2);
    }
}
