//! Connection manager
//!
//! Owns one live connection at a time and is the only component that touches
//! the wire. All socket I/O, the heartbeat tick, queued and immediate sends,
//! and inbound dispatch run inside one spawned driver task; callers talk to
//! the driver over an unbounded command channel, which also preserves FIFO
//! order for sends.
//!
//! ## State machine
//!
//! ```text
//! Idle ──> Connecting ──> Open ──> Closed
//!              ^            │
//!              └────────────┘  (ReconnectPolicy::Backoff only)
//! ```
//!
//! On every `Connecting -> Open` transition the driver (a) transmits the
//! bootstrap sequence (`GetUser`, then `GetProjects` for the first page),
//! (b) drains events queued while disconnected in strict FIFO order, then
//! (c) starts the heartbeat interval. `close()` is terminal under every
//! reconnect policy.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, Instant};
use tracing::{debug, info, warn};

use crate::config::{ClientConfig, ReconnectPolicy};
use crate::dispatch::Dispatcher;
use crate::error::{ClientError, ClientResult};
use crate::protocol::{ClientEnvelope, ClientEvent, ServerEnvelope};
use crate::transport::{Transport, TransportLink};

/// Lifecycle state of the managed connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Constructed, no attempt made yet
    Idle,
    /// Waiting for the socket to open
    Connecting,
    /// Live; sends transmit immediately
    Open,
    /// Terminal; the driver has stopped
    Closed,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Idle => write!(f, "Idle"),
            ConnectionState::Connecting => write!(f, "Connecting"),
            ConnectionState::Open => write!(f, "Open"),
            ConnectionState::Closed => write!(f, "Closed"),
        }
    }
}

/// Caller intent, carried to the driver task
enum Command {
    Send(ClientEvent),
    Close,
}

/// Why an open link ended
enum LinkOutcome {
    /// Caller asked to close; terminal
    ClosedByCaller,
    /// The wire dropped; the reconnect policy decides what happens next
    Lost,
}

/// Handle to the spawned connection driver
pub struct ConnectionManager {
    cmd_tx: mpsc::UnboundedSender<Command>,
    state_rx: watch::Receiver<ConnectionState>,
}

impl ConnectionManager {
    /// Spawn the driver task for `config` over `transport`
    ///
    /// Must be called within a tokio runtime. The driver immediately starts
    /// its first connection attempt.
    pub fn spawn(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        dispatcher: Dispatcher,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Idle);
        tokio::spawn(drive(config, transport, dispatcher, cmd_rx, state_tx));
        Self { cmd_tx, state_rx }
    }

    /// Fire-and-forget send
    ///
    /// If the connection is open the event is wrapped into an envelope and
    /// transmitted; otherwise it is appended to an ordered, unbounded queue
    /// and flushed on the next `Connecting -> Open` transition. No delivery
    /// confirmation exists at this layer.
    pub fn send(&self, event: ClientEvent) -> ClientResult<()> {
        self.cmd_tx
            .send(Command::Send(event))
            .map_err(|_| ClientError::ConnectionClosed)
    }

    /// Close the connection permanently
    ///
    /// Cancels the heartbeat, tears down the driver, and makes this handle
    /// inert under every reconnect policy.
    pub fn close(&self) {
        let _ = self.cmd_tx.send(Command::Close);
    }

    /// Watch the connection state
    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }
}

/// Driver task: owns the link, the pending queue, and the heartbeat
async fn drive(
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    dispatcher: Dispatcher,
    mut cmd_rx: mpsc::UnboundedReceiver<Command>,
    state_tx: watch::Sender<ConnectionState>,
) {
    let url = match config.socket_url() {
        Ok(url) => url,
        Err(err) => {
            warn!(%err, "cannot derive socket endpoint");
            let _ = state_tx.send(ConnectionState::Closed);
            return;
        }
    };

    // Events queued while disconnected, in call order
    let mut pending: VecDeque<ClientEvent> = VecDeque::new();
    let mut attempt: u32 = 0;

    loop {
        let _ = state_tx.send(ConnectionState::Connecting);

        // Stay responsive to commands while the connect is in flight, so a
        // hung connect cannot make the handle unclosable
        let connect = transport.connect(&url);
        tokio::pin!(connect);
        let connected = loop {
            tokio::select! {
                result = &mut connect => break result,
                cmd = cmd_rx.recv() => match cmd {
                    Some(Command::Send(event)) => pending.push_back(event),
                    Some(Command::Close) | None => {
                        let _ = state_tx.send(ConnectionState::Closed);
                        info!("connection closed");
                        return;
                    }
                },
            }
        };

        match connected {
            Ok(link) => {
                attempt = 0;
                let outcome = run_open(
                    &config,
                    &dispatcher,
                    &mut cmd_rx,
                    &state_tx,
                    &mut pending,
                    link,
                )
                .await;
                match outcome {
                    LinkOutcome::ClosedByCaller => {
                        let _ = state_tx.send(ConnectionState::Closed);
                        info!("connection closed");
                        return;
                    }
                    LinkOutcome::Lost => warn!("connection lost"),
                }
            }
            Err(err) => warn!(%err, "connection attempt failed"),
        }

        match config.reconnect {
            ReconnectPolicy::Never => {
                let _ = state_tx.send(ConnectionState::Closed);
                return;
            }
            ReconnectPolicy::Backoff { .. } => {
                let _ = state_tx.send(ConnectionState::Connecting);
                let delay = config.reconnect.delay_for(attempt);
                attempt = attempt.saturating_add(1);
                debug!(?delay, attempt, "reconnecting after backoff");

                let sleep = tokio::time::sleep(delay);
                tokio::pin!(sleep);
                loop {
                    tokio::select! {
                        _ = &mut sleep => break,
                        cmd = cmd_rx.recv() => match cmd {
                            Some(Command::Send(event)) => pending.push_back(event),
                            Some(Command::Close) | None => {
                                let _ = state_tx.send(ConnectionState::Closed);
                                return;
                            }
                        },
                    }
                }
            }
        }
    }
}

/// One open link: bootstrap, queue flush, then the select loop
async fn run_open(
    config: &ClientConfig,
    dispatcher: &Dispatcher,
    cmd_rx: &mut mpsc::UnboundedReceiver<Command>,
    state_tx: &watch::Sender<ConnectionState>,
    pending: &mut VecDeque<ClientEvent>,
    mut link: TransportLink,
) -> LinkOutcome {
    let _ = state_tx.send(ConnectionState::Open);
    info!("connection open");

    // Primed bootstrap sequence: current user, then the first projects page
    let bootstrap = [
        ClientEvent::GetUser,
        ClientEvent::get_projects(0, config.page_size),
    ];
    for event in bootstrap {
        if transmit(&mut link, event).is_err() {
            return LinkOutcome::Lost;
        }
    }

    // Strict FIFO flush of everything queued while disconnected
    while let Some(event) = pending.pop_front() {
        if let Err(event) = transmit(&mut link, event) {
            pending.push_front(event);
            return LinkOutcome::Lost;
        }
    }

    // First tick fires one full period after open, not immediately
    let mut heartbeat = interval_at(
        Instant::now() + config.heartbeat_interval,
        config.heartbeat_interval,
    );

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => match cmd {
                Some(Command::Send(event)) => {
                    if let Err(event) = transmit(&mut link, event) {
                        pending.push_front(event);
                        return LinkOutcome::Lost;
                    }
                }
                Some(Command::Close) | None => return LinkOutcome::ClosedByCaller,
            },
            frame = link.rx.recv() => match frame {
                Some(text) => match ServerEnvelope::decode(&text) {
                    Ok(envelope) => dispatcher.apply(envelope.payload),
                    // Malformed frames are discarded, never fatal
                    Err(err) => warn!(%err, "discarding undecodable frame"),
                },
                None => return LinkOutcome::Lost,
            },
            _ = heartbeat.tick() => {
                // Fire-and-forget; a failed heartbeat is just a failed send
                if transmit(&mut link, ClientEvent::heartbeat()).is_err() {
                    return LinkOutcome::Lost;
                }
            }
        }
    }
}

/// Wrap and transmit one event; on failure the event is handed back so it
/// can be re-queued
fn transmit(link: &mut TransportLink, event: ClientEvent) -> Result<(), ClientEvent> {
    let frame = match ClientEnvelope::new(event.clone()).encode() {
        Ok(frame) => frame,
        Err(err) => {
            // Encoding a closed union cannot fail in practice; drop and log
            warn!(%err, tag = event.type_tag(), "failed to encode event");
            return Ok(());
        }
    };
    debug!(tag = event.type_tag(), "transmitting");
    link.tx.send(frame).map_err(|_| event)
}
