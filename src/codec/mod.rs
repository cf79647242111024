//! Codec module - serialization for payload bodies.
//!
//! [`JsonCodec`] is the serialization capability for the `fastjson` wire
//! scheme; [`encode_call`]/[`decode_response`] build and interpret the
//! ordered body layout on top of it.

mod call;
mod json;

pub use call::{decode_response, encode_call, RpcResponse, DUBBO_VERSION};
pub use json::JsonCodec;
