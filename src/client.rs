//! Call orchestration.
//!
//! [`DubboClient`] drives a single call end to end: validate input, acquire
//! a connection, encode and send the frame, await the correlated response
//! under the call deadline, and map the outcome into a [`CallResult`]. No
//! error crosses the public boundary; every outcome is a result value.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio::time::Instant;

use crate::codec::encode_call;
use crate::config::ClientConfig;
use crate::connection::{connect, ConnectionManager};
use crate::correlator::{CallOutcome, RequestCorrelator};
use crate::error::{DubboError, Result};
use crate::invocation::{parse_args, Endpoint, ServiceInvocationTarget};

/// Caller-visible outcome of one call.
#[derive(Debug, Clone, Serialize)]
pub struct CallResult {
    /// Whether the call completed with an OK response.
    pub success: bool,
    /// Decoded success payload, when `success` is true.
    pub data: Option<Value>,
    /// Failure description, when `success` is false.
    pub error: Option<String>,
    /// Wall-clock duration of the call in milliseconds.
    pub elapsed_ms: u64,
    /// Request id used on the wire, once one was issued.
    pub request_id: Option<u64>,
}

/// Outcome of a transport-level connection test.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionTestResult {
    /// Whether a TCP connection could be established.
    pub success: bool,
    /// Time to establish (or fail) in milliseconds.
    pub elapsed_ms: u64,
    /// Failure description, when `success` is false.
    pub error: Option<String>,
}

/// Async Dubbo wire-protocol client.
///
/// Owns its [`ConnectionManager`] and [`RequestCorrelator`]; connections
/// live as long as the client unless the transport fails or
/// [`shutdown`](Self::shutdown) is called.
pub struct DubboClient {
    correlator: Arc<RequestCorrelator>,
    manager: ConnectionManager,
    config: ClientConfig,
}

impl DubboClient {
    /// Create a client with default configuration.
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Create a client with the given configuration.
    pub fn with_config(config: ClientConfig) -> Self {
        let correlator = Arc::new(RequestCorrelator::new());
        let manager = ConnectionManager::new(correlator.clone(), config.clone());
        Self {
            correlator,
            manager,
            config,
        }
    }

    /// Invoke a remote method and map every outcome to a [`CallResult`].
    ///
    /// `args_payload` is raw JSON: an array is the ordered argument list, a
    /// bare value is promoted to a single-element list.
    pub async fn call_method(
        &self,
        target: &ServiceInvocationTarget,
        args_payload: &str,
        endpoint: &Endpoint,
    ) -> CallResult {
        let started = Instant::now();
        let mut request_id = None;
        let outcome = self
            .execute_call(target, args_payload, endpoint, &mut request_id)
            .await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(data) => CallResult {
                success: true,
                data: Some(data),
                error: None,
                elapsed_ms,
                request_id,
            },
            Err(e) => {
                tracing::debug!(
                    interface = %target.interface_name,
                    method = %target.method_name,
                    error = %e,
                    "call failed"
                );
                CallResult {
                    success: false,
                    data: None,
                    error: Some(error_message(&e)),
                    elapsed_ms,
                    request_id,
                }
            }
        }
    }

    async fn execute_call(
        &self,
        target: &ServiceInvocationTarget,
        args_payload: &str,
        endpoint: &Endpoint,
        request_id_out: &mut Option<u64>,
    ) -> Result<Value> {
        // Fails fast before any network activity.
        let args = parse_args(args_payload)?;

        let conn = self.manager.get_or_create(endpoint).await?;
        // One outstanding call per connection; held until this call ends.
        let _slot = conn.acquire_call_slot().await?;

        let request_id = self.correlator.next_request_id();
        *request_id_out = Some(request_id);
        let frame_bytes = encode_call(target, &args, request_id)?;

        let pending = self.correlator.register(request_id, conn.endpoint_key());
        if let Err(e) = conn.send(&frame_bytes).await {
            self.correlator.discard(request_id);
            return Err(e);
        }

        let deadline = Duration::from_millis(endpoint.timeout_ms);
        match tokio::time::timeout(deadline, pending.wait()).await {
            Ok(CallOutcome::Response(response)) => {
                if response.is_error {
                    Err(DubboError::Remote(remote_message(&response.payload)))
                } else {
                    Ok(response.payload)
                }
            }
            Ok(CallOutcome::TimedOut) => Err(DubboError::Timeout(endpoint.timeout_ms)),
            Ok(CallOutcome::ConnectionLost) => Err(DubboError::ConnectionLost),
            Err(_) => {
                // Deadline elapsed: cancel only this call's registration,
                // never the connection.
                self.correlator.expire(request_id);
                Err(DubboError::Timeout(endpoint.timeout_ms))
            }
        }
    }

    /// Measure time to establish a throwaway TCP connection.
    ///
    /// No protocol handshake is performed and the connection table is not
    /// touched.
    pub async fn connection_test(&self, endpoint: &Endpoint) -> ConnectionTestResult {
        let started = Instant::now();
        let bound =
            Duration::from_millis(endpoint.timeout_ms).min(self.config.connect_timeout_ceiling);

        match connect(&endpoint.addr(), bound).await {
            Ok(_stream) => ConnectionTestResult {
                success: true,
                elapsed_ms: started.elapsed().as_millis() as u64,
                error: None,
            },
            Err(e) => ConnectionTestResult {
                success: false,
                elapsed_ms: started.elapsed().as_millis() as u64,
                error: Some(e.to_string()),
            },
        }
    }

    /// Number of calls currently awaiting a response.
    pub fn pending_calls(&self) -> usize {
        self.correlator.pending_count()
    }

    /// Close every connection and fail any calls still pending.
    pub fn shutdown(&self) {
        self.manager.shutdown();
    }
}

impl Default for DubboClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Caller-visible message for a failed call.
fn error_message(e: &DubboError) -> String {
    match e {
        DubboError::Timeout(_) => "timeout".to_string(),
        DubboError::ConnectionLost => "connection lost".to_string(),
        DubboError::Remote(message) => message.clone(),
        other => other.to_string(),
    }
}

/// Extract the remote error string, keeping it unchanged when it already is
/// one.
fn remote_message(payload: &Value) -> String {
    match payload {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
