//! TaskTick Core Library
//!
//! Realtime client synchronization layer for the TaskTick task-tracking
//! service: a persistent WebSocket connection that keeps a local, observable
//! replica of server-owned entities (users, projects, tasks, notes)
//! consistent with the remote source of truth.
//!
//! ## Overview
//!
//! - **Typed envelope**: every frame is JSON with a namespaced `_type` tag;
//!   both directions are closed unions, so unknown inbound tags degrade to a
//!   logged no-op and outbound tag/payload mismatches cannot be expressed.
//! - **Queued delivery**: sends issued while disconnected queue in FIFO
//!   order and flush after the bootstrap sequence on the next open.
//! - **Liveness**: a fixed-period heartbeat keeps intermediaries from timing
//!   out the connection; it is fire-and-forget.
//! - **Self-healing replica**: tasks and notes live in their own maps, and
//!   parent links are re-derived on parent upsert, so out-of-order arrival
//!   never drops a relationship.
//!
//! ## Quick Start
//!
//! ```ignore
//! use tasktick_core::{AuthClient, ClientConfig, ClientEvent, TasktickClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let auth = AuthClient::new("https://tasktick.example.com");
//!     let credentials = auth.login("ada@example.com", "hunter2").await?;
//!
//!     let config = ClientConfig::new("https://tasktick.example.com", credentials.auth_token);
//!     let client = TasktickClient::connect(config);
//!
//!     client.send(ClientEvent::new_project("Apollo", "moonshot"))?;
//!
//!     let mut events = client.stores().subscribe();
//!     while let Ok(event) = events.recv().await {
//!         println!("{:?}", event);
//!     }
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod protocol;
pub mod store;
pub mod transport;
pub mod types;

// Re-exports
pub use auth::{AuthClient, Credentials};
pub use client::TasktickClient;
pub use config::{ClientConfig, ReconnectPolicy, DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_PAGE_SIZE};
pub use connection::{ConnectionManager, ConnectionState};
pub use dispatch::Dispatcher;
pub use error::{ClientError, ClientResult};
pub use protocol::{
    ClientEnvelope, ClientEvent, ProjectWire, ServerEnvelope, ServerEvent, EVENT_NAMESPACE,
};
pub use store::{StoreEvent, Stores};
pub use transport::{Transport, TransportLink, WsTransport};
pub use types::*;
