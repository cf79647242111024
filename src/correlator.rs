//! Request identifier issue and response correlation.
//!
//! One [`RequestCorrelator`] is shared by all calls of a client. Each call
//! registers a pending entry under its request id before sending; the
//! connection receive path resolves the entry when a frame with a matching
//! id is decoded. A response with no matching entry is an orphan and is
//! logged and dropped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tokio::sync::oneshot;

use crate::codec::RpcResponse;

/// Final outcome delivered to a waiting call.
#[derive(Debug)]
pub enum CallOutcome {
    /// A correlated response arrived.
    Response(RpcResponse),
    /// The call's deadline elapsed first.
    TimedOut,
    /// The connection carrying the call failed.
    ConnectionLost,
}

struct Pending {
    tx: oneshot::Sender<CallOutcome>,
    endpoint_key: String,
}

/// Completion handle for one outstanding call.
///
/// Held by the calling task; resolved exactly once, by the correlator's
/// resolve, expire, or connection-failure path.
pub struct PendingCall {
    rx: oneshot::Receiver<CallOutcome>,
}

impl PendingCall {
    /// Suspend until the call is resolved.
    pub async fn wait(self) -> CallOutcome {
        // The sender is only dropped if the client is torn down mid-call.
        self.rx.await.unwrap_or(CallOutcome::ConnectionLost)
    }
}

/// Issues request identifiers and matches responses to in-flight calls.
pub struct RequestCorrelator {
    next_id: AtomicU64,
    pending: Mutex<HashMap<u64, Pending>>,
}

impl RequestCorrelator {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Atomically issue the next request id.
    ///
    /// Monotonically increasing; an id still registered as pending is
    /// skipped rather than reused.
    pub fn next_request_id(&self) -> u64 {
        loop {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
            if !self.pending.lock().unwrap().contains_key(&id) {
                return id;
            }
        }
    }

    /// Register a pending call under `request_id` on the given connection.
    pub fn register(&self, request_id: u64, endpoint_key: &str) -> PendingCall {
        let (tx, rx) = oneshot::channel();
        let previous = self.pending.lock().unwrap().insert(
            request_id,
            Pending {
                tx,
                endpoint_key: endpoint_key.to_string(),
            },
        );
        debug_assert!(previous.is_none(), "request id reused while pending");
        PendingCall { rx }
    }

    /// Complete the matching pending call, if present.
    ///
    /// Returns false for orphan responses, which are logged and dropped.
    pub fn resolve(&self, response: RpcResponse) -> bool {
        let entry = self.pending.lock().unwrap().remove(&response.request_id);
        match entry {
            Some(pending) => {
                let _ = pending.tx.send(CallOutcome::Response(response));
                true
            }
            None => {
                tracing::warn!(
                    request_id = response.request_id,
                    "discarding orphan response"
                );
                false
            }
        }
    }

    /// Complete the pending call with a timeout outcome and remove it.
    ///
    /// Independent of the connection's state; a no-op if the call already
    /// resolved.
    pub fn expire(&self, request_id: u64) {
        if let Some(pending) = self.pending.lock().unwrap().remove(&request_id) {
            let _ = pending.tx.send(CallOutcome::TimedOut);
        }
    }

    /// Remove a pending call without completing it.
    ///
    /// Used when the send fails before the receive path could ever resolve
    /// the entry.
    pub fn discard(&self, request_id: u64) {
        self.pending.lock().unwrap().remove(&request_id);
    }

    /// Fail every pending call registered on the given connection.
    pub fn fail_connection(&self, endpoint_key: &str) {
        let mut pending = self.pending.lock().unwrap();
        let failed: Vec<u64> = pending
            .iter()
            .filter(|(_, p)| p.endpoint_key == endpoint_key)
            .map(|(id, _)| *id)
            .collect();
        for id in failed {
            if let Some(p) = pending.remove(&id) {
                let _ = p.tx.send(CallOutcome::ConnectionLost);
            }
        }
    }

    /// Number of calls currently pending across the whole client.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }
}

impl Default for RequestCorrelator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::STATUS_OK;
    use serde_json::json;

    fn response(request_id: u64) -> RpcResponse {
        RpcResponse {
            request_id,
            status: STATUS_OK,
            payload: json!({"ok": true}),
            is_error: false,
        }
    }

    #[test]
    fn test_ids_are_monotonic_and_unique() {
        let correlator = RequestCorrelator::new();
        let a = correlator.next_request_id();
        let b = correlator.next_request_id();
        let c = correlator.next_request_id();
        assert!(a < b && b < c);
    }

    #[test]
    fn test_pending_id_is_not_reused() {
        let correlator = RequestCorrelator::new();
        let _call = correlator.register(1, "h:1");
        // Force the counter to wrap onto the pending id.
        correlator.next_id.store(0, Ordering::Relaxed);
        assert_eq!(correlator.next_request_id(), 2);
    }

    #[tokio::test]
    async fn test_resolve_completes_matching_call() {
        let correlator = RequestCorrelator::new();
        let id = correlator.next_request_id();
        let call = correlator.register(id, "h:1");

        assert!(correlator.resolve(response(id)));
        assert_eq!(correlator.pending_count(), 0);

        match call.wait().await {
            CallOutcome::Response(r) => assert_eq!(r.request_id, id),
            other => panic!("expected response, got {:?}", other),
        }
    }

    #[test]
    fn test_orphan_response_is_dropped() {
        let correlator = RequestCorrelator::new();
        assert!(!correlator.resolve(response(999)));
    }

    #[tokio::test]
    async fn test_expire_removes_and_times_out() {
        let correlator = RequestCorrelator::new();
        let call = correlator.register(5, "h:1");

        correlator.expire(5);
        assert_eq!(correlator.pending_count(), 0);
        assert!(matches!(call.wait().await, CallOutcome::TimedOut));

        // Late response after expiry is an orphan.
        assert!(!correlator.resolve(response(5)));
    }

    #[tokio::test]
    async fn test_fail_connection_scoped_to_endpoint() {
        let correlator = RequestCorrelator::new();
        let lost = correlator.register(1, "a:1");
        let kept = correlator.register(2, "b:2");

        correlator.fail_connection("a:1");

        assert!(matches!(lost.wait().await, CallOutcome::ConnectionLost));
        assert_eq!(correlator.pending_count(), 1);
        assert!(correlator.resolve(response(2)));
        assert!(matches!(kept.wait().await, CallOutcome::Response(_)));
    }
}
