//! Client configuration.

use std::time::Duration;

/// Default ceiling on connection establishment time.
///
/// The effective connect timeout for an endpoint is the minimum of its
/// configured call timeout and this ceiling.
pub const DEFAULT_CONNECT_TIMEOUT_CEILING: Duration = Duration::from_secs(5);

/// Default maximum body size accepted from the wire (16 MB).
pub const DEFAULT_MAX_BODY_SIZE: u32 = 16 * 1024 * 1024;

/// Default socket read buffer size (64 KB).
pub const DEFAULT_READ_BUFFER_SIZE: usize = 64 * 1024;

/// Configuration for a [`DubboClient`](crate::DubboClient) instance.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Upper bound on connection establishment time.
    pub connect_timeout_ceiling: Duration,
    /// Maximum declared body length accepted from the wire.
    pub max_body_size: u32,
    /// Size of the per-connection socket read buffer.
    pub read_buffer_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ceiling: DEFAULT_CONNECT_TIMEOUT_CEILING,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }
}
