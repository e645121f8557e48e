//! Wire transport seam
//!
//! The connection driver talks to the network through [`Transport`], which
//! yields a [`TransportLink`]: a pair of unbounded channels carrying whole
//! text frames. The production implementation bridges a tokio-tungstenite
//! WebSocket onto those channels with two pump tasks; tests swap in an
//! in-memory transport and drive both ends directly.

use futures::future::BoxFuture;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};

/// One live connection as seen by the driver
///
/// Dropping the link (or just `tx`) closes the outbound side; `rx` yielding
/// `None` means the remote side is gone.
pub struct TransportLink {
    /// Outbound text frames toward the wire
    pub tx: mpsc::UnboundedSender<String>,
    /// Inbound text frames off the wire
    pub rx: mpsc::UnboundedReceiver<String>,
}

/// Connects to an endpoint and yields a framed link
pub trait Transport: Send + Sync {
    /// Open one connection to `url`
    fn connect<'a>(&'a self, url: &'a str) -> BoxFuture<'a, ClientResult<TransportLink>>;
}

/// Production transport over tokio-tungstenite
pub struct WsTransport;

impl Transport for WsTransport {
    fn connect<'a>(&'a self, url: &'a str) -> BoxFuture<'a, ClientResult<TransportLink>> {
        Box::pin(async move {
            let (socket, _response) = tokio_tungstenite::connect_async(url)
                .await
                .map_err(|e| ClientError::Transport(e.to_string()))?;
            debug!("websocket open");

            let (mut sink, mut stream) = socket.split();
            let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
            let (in_tx, in_rx) = mpsc::unbounded_channel::<String>();

            // Writer pump: driver frames -> socket. Ends when the driver
            // drops its sender, then closes the socket.
            tokio::spawn(async move {
                while let Some(text) = out_rx.recv().await {
                    if let Err(err) = sink.send(Message::Text(text)).await {
                        warn!(%err, "websocket send failed");
                        break;
                    }
                }
                let _ = sink.close().await;
            });

            // Reader pump: socket -> driver frames. Non-text frames are the
            // socket layer's concern and are skipped here.
            tokio::spawn(async move {
                while let Some(message) = stream.next().await {
                    match message {
                        Ok(Message::Text(text)) => {
                            if in_tx.send(text).is_err() {
                                break;
                            }
                        }
                        Ok(Message::Close(_)) => break,
                        Ok(_) => {}
                        Err(err) => {
                            warn!(%err, "websocket receive failed");
                            break;
                        }
                    }
                }
            });

            Ok(TransportLink {
                tx: out_tx,
                rx: in_rx,
            })
        })
    }
}
