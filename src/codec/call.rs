//! Request-body encoding and response decoding.
//!
//! A request body is a sequence of newline-terminated JSON values in fixed
//! order: protocol-version tag, interface name, service version, method
//! name, the type-descriptor string for the arguments, each argument in
//! call order, then the attachments map. A response body is a single JSON
//! value: the success payload on status OK, an error-message string on any
//! other status.

use serde_json::{Map, Value};

use crate::codec::JsonCodec;
use crate::error::Result;
use crate::invocation::{type_descriptor, ServiceInvocationTarget};
use crate::protocol::{build_frame, Frame, Header};

/// Protocol-version tag written first in every request body.
pub const DUBBO_VERSION: &str = "2.0.2";

/// A decoded inbound response.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcResponse {
    /// Request identifier this response correlates to.
    pub request_id: u64,
    /// Raw status byte from the header.
    pub status: u8,
    /// Success payload, or the remote error message as a JSON string.
    pub payload: Value,
    /// True when the status was anything other than OK.
    pub is_error: bool,
}

/// Encode a call into complete wire bytes (header + body).
pub fn encode_call(
    target: &ServiceInvocationTarget,
    args: &[Value],
    request_id: u64,
) -> Result<Vec<u8>> {
    let mut body = Vec::new();

    write_value(&mut body, &Value::from(DUBBO_VERSION))?;
    write_value(&mut body, &Value::from(target.interface_name.as_str()))?;
    write_value(&mut body, &Value::from(target.service_version.as_str()))?;
    write_value(&mut body, &Value::from(target.method_name.as_str()))?;

    let types: String = args.iter().map(type_descriptor).collect();
    write_value(&mut body, &Value::from(types))?;

    for arg in args {
        write_value(&mut body, arg)?;
    }

    write_value(&mut body, &attachments(target))?;

    let header = Header::request(request_id, body.len() as u32);
    Ok(build_frame(&header, &body))
}

/// Decode a complete inbound frame into an [`RpcResponse`].
///
/// Status OK decodes the payload as the success value; any other status
/// decodes it as a single error-message string.
pub fn decode_response(frame: &Frame) -> RpcResponse {
    let payload = JsonCodec::decode_lenient(frame.payload());
    RpcResponse {
        request_id: frame.request_id(),
        status: frame.status(),
        payload,
        is_error: !frame.is_ok(),
    }
}

fn write_value(buf: &mut Vec<u8>, value: &Value) -> Result<()> {
    buf.extend_from_slice(&JsonCodec::encode(value)?);
    buf.push(b'\n');
    Ok(())
}

fn attachments(target: &ServiceInvocationTarget) -> Value {
    let mut map = Map::new();
    map.insert("path".into(), target.interface_name.clone().into());
    map.insert("interface".into(), target.interface_name.clone().into());
    map.insert("version".into(), target.service_version.clone().into());
    if let Some(group) = &target.group {
        map.insert("group".into(), group.clone().into());
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{FrameBuffer, HEADER_SIZE, MAGIC, STATUS_OK};
    use bytes::Bytes;
    use serde_json::json;

    fn target() -> ServiceInvocationTarget {
        ServiceInvocationTarget::new("com.x.UserService", "getUserInfo", "1.0.0")
    }

    fn body_lines(bytes: &[u8]) -> Vec<Value> {
        bytes[HEADER_SIZE..]
            .split(|&b| b == b'\n')
            .filter(|line| !line.is_empty())
            .map(|line| serde_json::from_slice(line).unwrap())
            .collect()
    }

    #[test]
    fn test_encode_call_header_shape() {
        let args = vec![json!({"userId": "123456"})];
        let bytes = encode_call(&target(), &args, 7).unwrap();

        let header = Header::decode(&bytes[..HEADER_SIZE]).unwrap();
        assert!(header.is_request());
        assert!(header.is_two_way());
        assert_eq!(header.status, 0);
        assert_eq!(header.request_id, 7);
        assert_eq!(header.body_length as usize, bytes.len() - HEADER_SIZE);
        assert_eq!(u16::from_be_bytes([bytes[0], bytes[1]]), MAGIC);
    }

    #[test]
    fn test_encode_call_body_order() {
        let args = vec![json!({"userId": "123456"})];
        let bytes = encode_call(&target(), &args, 7).unwrap();

        let lines = body_lines(&bytes);
        assert_eq!(lines[0], json!(DUBBO_VERSION));
        assert_eq!(lines[1], json!("com.x.UserService"));
        assert_eq!(lines[2], json!("1.0.0"));
        assert_eq!(lines[3], json!("getUserInfo"));
        assert_eq!(lines[4], json!("Ljava/lang/Object;"));
        assert_eq!(lines[5], json!({"userId": "123456"}));
        assert_eq!(
            lines[6],
            json!({
                "path": "com.x.UserService",
                "interface": "com.x.UserService",
                "version": "1.0.0",
            })
        );
    }

    #[test]
    fn test_encode_call_mixed_arg_types() {
        let args = vec![json!("id"), json!(5), json!(2.5), json!(false)];
        let bytes = encode_call(&target(), &args, 1).unwrap();

        let lines = body_lines(&bytes);
        assert_eq!(
            lines[4],
            json!("Ljava/lang/String;Ljava/lang/Long;Ljava/lang/Double;Ljava/lang/Boolean;")
        );
        assert_eq!(&lines[5..9], &args[..]);
    }

    #[test]
    fn test_encode_call_group_attachment() {
        let target = target().with_group("gray");
        let bytes = encode_call(&target, &[], 1).unwrap();

        let lines = body_lines(&bytes);
        assert_eq!(lines.last().unwrap()["group"], json!("gray"));
    }

    #[test]
    fn test_decode_response_ok() {
        let payload = serde_json::to_vec(&json!({"name": "zhangsan"})).unwrap();
        let header = Header::response(STATUS_OK, 9, payload.len() as u32);
        let frame = Frame::new(header, Bytes::from(payload));

        let response = decode_response(&frame);
        assert_eq!(response.request_id, 9);
        assert_eq!(response.status, STATUS_OK);
        assert!(!response.is_error);
        assert_eq!(response.payload, json!({"name": "zhangsan"}));
    }

    #[test]
    fn test_decode_response_error_status() {
        let payload = serde_json::to_vec(&json!("service not found")).unwrap();
        let header = Header::response(80, 9, payload.len() as u32);
        let frame = Frame::new(header, Bytes::from(payload));

        let response = decode_response(&frame);
        assert!(response.is_error);
        assert_eq!(response.payload, json!("service not found"));
    }

    #[test]
    fn test_decode_response_is_pure() {
        let payload = serde_json::to_vec(&json!([1, 2, 3])).unwrap();
        let header = Header::response(STATUS_OK, 3, payload.len() as u32);
        let frame = Frame::new(header, Bytes::from(payload));

        let first = decode_response(&frame);
        let second = decode_response(&frame);
        assert_eq!(first, second);
    }

    #[test]
    fn test_roundtrip_through_frame_buffer() {
        let args = vec![json!({"userId": "123456"})];
        let bytes = encode_call(&target(), &args, 7).unwrap();

        let mut buffer = FrameBuffer::new(u32::MAX);
        let frames = buffer.push(&bytes).unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].request_id(), 7);
        assert_eq!(frames[0].header.body_length as usize, frames[0].payload.len());
        assert_eq!(frames[0].status(), 0);
    }
}
