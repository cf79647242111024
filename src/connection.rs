//! Connection ownership and the per-connection receive path.
//!
//! The [`ConnectionManager`] owns one TCP connection per endpoint key
//! (`host:port`), created lazily on first use. Each connection runs a
//! reader task that feeds a [`FrameBuffer`] and hands every decoded
//! response to the shared correlator. On transport error or close, all
//! pending calls on that connection fail with `ConnectionLost` and the
//! entry is evicted so a later call re-establishes it.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, Weak};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, Semaphore, SemaphorePermit};
use tokio::task::JoinHandle;

use crate::codec::decode_response;
use crate::config::ClientConfig;
use crate::correlator::RequestCorrelator;
use crate::error::{DubboError, Result};
use crate::invocation::Endpoint;
use crate::protocol::FrameBuffer;

/// One live TCP connection, exclusively owned by the manager.
pub struct Connection {
    endpoint_key: String,
    writer: Mutex<OwnedWriteHalf>,
    /// One permit: at most one call outstanding on this connection.
    call_slot: Semaphore,
    closed: AtomicBool,
    reader: StdMutex<Option<JoinHandle<()>>>,
}

impl Connection {
    /// Connection-table key (`host:port`) of this connection.
    pub fn endpoint_key(&self) -> &str {
        &self.endpoint_key
    }

    /// Whether the transport has errored or been closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Acquire the connection's single call slot.
    ///
    /// Additional concurrent calls to the same endpoint queue here behind
    /// the in-flight one; the permit is held for the whole call.
    pub async fn acquire_call_slot(&self) -> Result<SemaphorePermit<'_>> {
        self.call_slot
            .acquire()
            .await
            .map_err(|_| DubboError::ConnectionLost)
    }

    /// Write a complete frame in one operation.
    ///
    /// The write lock keeps concurrent sends on this connection from
    /// interleaving; with the call slot held there is no contention.
    pub async fn send(&self, frame_bytes: &[u8]) -> Result<()> {
        if self.is_closed() {
            return Err(DubboError::ConnectionLost);
        }
        let mut writer = self.writer.lock().await;
        writer.write_all(frame_bytes).await?;
        writer.flush().await?;
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.call_slot.close();
        if let Some(handle) = self.reader.lock().unwrap().take() {
            handle.abort();
        }
    }
}

type Slot = Arc<Mutex<Option<Arc<Connection>>>>;

struct Inner {
    connections: StdMutex<HashMap<String, Slot>>,
    correlator: Arc<RequestCorrelator>,
    config: ClientConfig,
}

impl Inner {
    fn evict(&self, key: &str, conn: &Arc<Connection>) {
        let slot = self.connections.lock().unwrap().get(key).cloned();
        if let Some(slot) = slot {
            // try_lock only: if a creator holds the slot it is already
            // replacing this connection.
            if let Ok(mut guard) = slot.try_lock() {
                if guard.as_ref().is_some_and(|c| Arc::ptr_eq(c, conn)) {
                    *guard = None;
                }
            }
        }
    }
}

/// Owns the endpoint → connection table; injected into the client.
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

impl ConnectionManager {
    pub fn new(correlator: Arc<RequestCorrelator>, config: ClientConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                connections: StdMutex::new(HashMap::new()),
                correlator,
                config,
            }),
        }
    }

    /// Look up the connection for an endpoint, establishing it if absent.
    ///
    /// Establishment is bounded by the smaller of the endpoint timeout and
    /// the configured ceiling. Per-endpoint slots serialize creation so two
    /// concurrent calls never race to open duplicate connections, while
    /// distinct endpoints proceed in parallel.
    pub async fn get_or_create(&self, endpoint: &Endpoint) -> Result<Arc<Connection>> {
        let key = endpoint.key();
        let slot = self
            .inner
            .connections
            .lock()
            .unwrap()
            .entry(key.clone())
            .or_default()
            .clone();

        let mut guard = slot.lock().await;
        if let Some(conn) = guard.as_ref() {
            if !conn.is_closed() {
                return Ok(conn.clone());
            }
        }

        let conn = self.establish(endpoint, key).await?;
        *guard = Some(conn.clone());
        Ok(conn)
    }

    async fn establish(&self, endpoint: &Endpoint, key: String) -> Result<Arc<Connection>> {
        let connect_timeout = Duration::from_millis(endpoint.timeout_ms)
            .min(self.inner.config.connect_timeout_ceiling);
        let stream = connect(&endpoint.addr(), connect_timeout).await?;
        let (read_half, write_half) = stream.into_split();

        let conn = Arc::new(Connection {
            endpoint_key: key,
            writer: Mutex::new(write_half),
            call_slot: Semaphore::new(1),
            closed: AtomicBool::new(false),
            reader: StdMutex::new(None),
        });

        let handle = tokio::spawn(read_loop(
            read_half,
            conn.clone(),
            self.inner.correlator.clone(),
            Arc::downgrade(&self.inner),
        ));
        *conn.reader.lock().unwrap() = Some(handle);

        tracing::debug!(endpoint = %conn.endpoint_key, "connection established");
        Ok(conn)
    }

    /// Number of live table entries (for tests and introspection).
    pub fn connection_count(&self) -> usize {
        self.inner.connections.lock().unwrap().len()
    }

    /// Close every connection and clear the table.
    ///
    /// Pending calls on each connection fail with `ConnectionLost`.
    pub fn shutdown(&self) {
        let slots: Vec<(String, Slot)> = self.inner.connections.lock().unwrap().drain().collect();
        for (key, slot) in slots {
            if let Ok(mut guard) = slot.try_lock() {
                if let Some(conn) = guard.take() {
                    conn.close();
                }
            }
            self.inner.correlator.fail_connection(&key);
        }
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Open a TCP connection bounded by `connect_timeout`.
///
/// Also used by the client's connection test, which deliberately bypasses
/// the connection table.
pub async fn connect(addr: &str, connect_timeout: Duration) -> Result<TcpStream> {
    match tokio::time::timeout(connect_timeout, TcpStream::connect(addr)).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(e)) if e.kind() == ErrorKind::ConnectionRefused => {
            Err(DubboError::ConnectionRefused(addr.to_string()))
        }
        Ok(Err(e)) => Err(e.into()),
        Err(_) => Err(DubboError::ConnectTimeout(addr.to_string())),
    }
}

/// Per-connection receive path.
///
/// Reads chunks, appends them to the accumulator, and resolves every
/// extracted frame through the correlator. Runs until transport error,
/// close, or a connection-fatal frame error.
async fn read_loop(
    mut reader: OwnedReadHalf,
    conn: Arc<Connection>,
    correlator: Arc<RequestCorrelator>,
    manager: Weak<Inner>,
) {
    let (max_body, buf_size) = match manager.upgrade() {
        Some(inner) => (inner.config.max_body_size, inner.config.read_buffer_size),
        None => return,
    };
    let mut frame_buffer = FrameBuffer::new(max_body);
    let mut buf = vec![0u8; buf_size];

    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => {
                tracing::debug!(endpoint = %conn.endpoint_key, "connection closed by peer");
                break;
            }
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(endpoint = %conn.endpoint_key, error = %e, "read error");
                break;
            }
        };

        let frames = match frame_buffer.push(&buf[..n]) {
            Ok(frames) => frames,
            Err(e) => {
                tracing::error!(endpoint = %conn.endpoint_key, error = %e, "fatal frame error");
                break;
            }
        };

        for frame in frames {
            correlator.resolve(decode_response(&frame));
        }
    }

    conn.closed.store(true, Ordering::Release);
    correlator.fail_connection(&conn.endpoint_key);
    if let Some(inner) = manager.upgrade() {
        inner.evict(&conn.endpoint_key, &conn);
    }
}
