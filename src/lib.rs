//! # dubbo-client
//!
//! Async client for the Dubbo binary wire protocol.
//!
//! The client frames calls into the fixed 16-byte-header format, manages
//! one TCP connection per remote endpoint, and correlates asynchronous
//! requests with their responses under a per-call deadline.
//!
//! ## Architecture
//!
//! - **protocol**: 16-byte header wire format and the receive accumulator
//! - **codec**: JSON payload bodies and the ordered request-body layout
//! - **correlator**: request-id issue and pending-call resolution
//! - **connection**: per-endpoint connection table and reader tasks
//! - **client**: per-call orchestration; every outcome is a [`CallResult`]
//!
//! ## Example
//!
//! ```ignore
//! use dubbo_client::{DubboClient, Endpoint, ServiceInvocationTarget};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = DubboClient::new();
//!     let target = ServiceInvocationTarget::new("com.x.UserService", "getUserInfo", "1.0.0");
//!     let endpoint = Endpoint::new("127.0.0.1", 20880, 3000);
//!
//!     let result = client
//!         .call_method(&target, r#"{"userId":"123456"}"#, &endpoint)
//!         .await;
//!     println!("{:?}", result);
//! }
//! ```

pub mod codec;
pub mod config;
pub mod connection;
pub mod correlator;
pub mod error;
pub mod invocation;
pub mod protocol;

mod client;

pub use client::{CallResult, ConnectionTestResult, DubboClient};
pub use config::ClientConfig;
pub use error::{DubboError, FrameError, Result};
pub use invocation::{Endpoint, ServiceInvocationTarget};
