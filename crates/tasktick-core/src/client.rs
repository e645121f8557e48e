//! Sync client facade
//!
//! [`TasktickClient`] is the composition root: it binds the connection
//! manager, the dispatcher, and the entity stores, and exposes nothing
//! beyond `send`, `close`, read access to the stores, and the connection
//! state watch.

use std::sync::Arc;

use tokio::sync::watch;

use crate::config::ClientConfig;
use crate::connection::{ConnectionManager, ConnectionState};
use crate::dispatch::Dispatcher;
use crate::error::ClientResult;
use crate::protocol::ClientEvent;
use crate::store::Stores;
use crate::transport::{Transport, WsTransport};

/// Realtime sync client for the TaskTick gateway
///
/// # Example
///
/// ```ignore
/// use tasktick_core::{ClientConfig, ClientEvent, TasktickClient};
///
/// let config = ClientConfig::new("https://tasktick.example.com", auth_token);
/// let client = TasktickClient::connect(config);
///
/// // Fire-and-forget; queued until the socket opens
/// client.send(ClientEvent::new_project("Apollo", "moonshot"))?;
///
/// for project in client.stores().projects() {
///     println!("{}: {}", project.id, project.name);
/// }
/// ```
pub struct TasktickClient {
    stores: Stores,
    conn: ConnectionManager,
}

impl TasktickClient {
    /// Connect over the production WebSocket transport
    ///
    /// Returns immediately; the connection is established in the background
    /// and `state()` can be watched for the `Open` transition. Must be
    /// called within a tokio runtime.
    pub fn connect(config: ClientConfig) -> Self {
        Self::connect_with(config, Arc::new(WsTransport))
    }

    /// Connect over an injected transport (test seam)
    pub fn connect_with(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let stores = Stores::new();
        let dispatcher = Dispatcher::new(stores.clone());
        let conn = ConnectionManager::spawn(config, transport, dispatcher);
        Self { stores, conn }
    }

    /// Fire-and-forget send; see [`ConnectionManager::send`]
    pub fn send(&self, event: ClientEvent) -> ClientResult<()> {
        self.conn.send(event)
    }

    /// Close the connection permanently
    ///
    /// The replica is left intact; logout flows call `stores().clear()`
    /// separately for the single observable reset.
    pub fn close(&self) {
        self.conn.close();
    }

    /// Read access to the entity replica
    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    /// Watch the connection state
    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.conn.state()
    }
}
