//! Protocol module - wire format, framing, and frame types.
//!
//! This module implements the binary Dubbo framing:
//! - 16-byte header encoding/decoding
//! - Receive accumulator for extracting frames from partial reads
//! - Frame struct with typed accessors

mod frame;
mod frame_buffer;
mod wire_format;

pub use frame::{build_frame, Frame};
pub use frame_buffer::FrameBuffer;
pub use wire_format::{flags, Header, HEADER_SIZE, MAGIC, STATUS_OK};
