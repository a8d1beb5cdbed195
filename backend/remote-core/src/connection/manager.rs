//! Connection manager task.
//!
//! One tokio task owns the socket, the status and the keepalive timer. It
//! consumes three inputs from a single `select!` loop:
//!
//! - commands from [`ConnectionHandle`]s (send, stop)
//! - socket events from the reader task of the current connection
//! - keepalive ticks
//!
//! so a message handler never runs concurrently with another handler, a send or
//! a reconnect. Each connection gets a fresh id; events carrying an older id
//! belong to a replaced socket and are ignored.

use crate::config::ConnectionConfig;
use crate::connection::handle::{Command, ConnectionHandle};
use crate::connection::reconnect::ReconnectSchedule;
use crate::connection::transport::{Connector, FrameSink, FrameSource, server_url};
use crate::connection::{ConnectionStatus, MessageHandler, ReadyState};
use crate::error::connection::ConnectionError;
use crate::protocol::{Outbound, RawFrame, decode, encode};

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, trace, warn};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

const MIN_KEEPALIVE_INTERVAL: Duration = Duration::from_millis(1);

/// Raw socket events, tagged with the connection they came from.
enum SocketEvent<S> {
    Opened { connection_id: u64, sink: S },
    Frame { connection_id: u64, frame: RawFrame },
    Error { connection_id: u64, error: ConnectionError },
    Closed { connection_id: u64 },
}

struct Connection<S> {
    id: u64,
    ready_state: ReadyState,
    sink: Option<S>,
    reader: JoinHandle<()>,
}

/// Owns at most one socket and keeps it alive.
///
/// Create it, hand out [`handle`](Self::handle)s to whoever needs to send, then
/// [`start`](Self::start) it with the handler for inbound messages.
pub struct ConnectionManager<C: Connector> {
    connector: Arc<C>,
    url: String,
    keepalive_interval: Duration,
    reconnect: ReconnectSchedule,
    command_tx: mpsc::UnboundedSender<Command>,
    command_rx: mpsc::UnboundedReceiver<Command>,
    status_tx: watch::Sender<ConnectionStatus>,
}

impl<C: Connector> ConnectionManager<C> {
    /// Prepare a manager for `address`. Nothing is opened until [`start`](Self::start).
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::TransportUnavailable`] if no WebSocket URL can be
    /// built from `address`. This is fatal and should be reported, not retried.
    pub fn new(
        connector: C,
        address: &str,
        config: &ConnectionConfig,
    ) -> Result<Self, ConnectionError> {
        let url = server_url(address)?;
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (status_tx, _) = watch::channel(ConnectionStatus::Disconnected);

        Ok(Self {
            connector: Arc::new(connector),
            url: url.to_string(),
            keepalive_interval: config.keepalive_interval().max(MIN_KEEPALIVE_INTERVAL),
            reconnect: ReconnectSchedule::new(config.reconnect),
            command_tx,
            command_rx,
            status_tx,
        })
    }

    pub fn handle(&self) -> ConnectionHandle {
        ConnectionHandle::new(self.command_tx.clone(), self.status_tx.subscribe())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Open the first connection and run until [`ConnectionHandle::stop`] is
    /// called or every handle is dropped. Must be called inside a tokio runtime.
    pub fn start<H: MessageHandler>(self, handler: H) -> JoinHandle<()> {
        let ConnectionManager {
            connector,
            url,
            keepalive_interval,
            reconnect,
            command_tx,
            command_rx,
            status_tx,
        } = self;

        // Only handles keep the command channel open
        drop(command_tx);

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let actor = ManagerActor {
            connector,
            url,
            reconnect,
            handler,
            status_tx,
            event_tx,
            connection: None,
            next_connection_id: 0,
        };

        tokio::spawn(actor.run(command_rx, event_rx, keepalive_interval))
    }
}

struct ManagerActor<C: Connector, H> {
    connector: Arc<C>,
    url: String,
    reconnect: ReconnectSchedule,
    handler: H,
    status_tx: watch::Sender<ConnectionStatus>,
    event_tx: mpsc::UnboundedSender<SocketEvent<C::Sink>>,
    connection: Option<Connection<C::Sink>>,
    next_connection_id: u64,
}

impl<C: Connector, H: MessageHandler> ManagerActor<C, H> {
    async fn run(
        mut self,
        mut command_rx: mpsc::UnboundedReceiver<Command>,
        mut event_rx: mpsc::UnboundedReceiver<SocketEvent<C::Sink>>,
        keepalive_interval: Duration,
    ) {
        info!("Connection manager started for {}", self.url);
        self.open_connection();

        let mut keepalive = interval_at(Instant::now() + keepalive_interval, keepalive_interval);
        keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                command = command_rx.recv() => match command {
                    Some(Command::Send(outbound)) => self.write(outbound).await,
                    Some(Command::Stop) => {
                        info!("Connection manager stop requested");
                        break;
                    }
                    None => {
                        info!("All connection handles dropped");
                        break;
                    }
                },
                Some(event) = event_rx.recv() => self.handle_event(event).await,
                _ = keepalive.tick() => self.on_keepalive_tick().await,
            }
        }

        self.shutdown().await;
    }

    fn status(&self) -> ConnectionStatus {
        ConnectionStatus::from_ready_state(self.connection.as_ref().map(|c| c.ready_state))
    }

    fn publish_status(&self) {
        let status = self.status();
        self.status_tx.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            info!("Connection status: {current} -> {status}");
            *current = status;
            true
        });
    }

    fn is_current(&self, connection_id: u64) -> bool {
        self.connection
            .as_ref()
            .is_some_and(|connection| connection.id == connection_id)
    }

    /// Replace the (absent) connection with a fresh attempt.
    fn open_connection(&mut self) {
        self.next_connection_id += 1;
        let connection_id = self.next_connection_id;
        self.reconnect.attempt_started(Instant::now());

        info!("Connecting to {} (connection #{connection_id})", self.url);

        let reader = tokio::spawn(run_connection(
            Arc::clone(&self.connector),
            self.url.clone(),
            connection_id,
            self.event_tx.clone(),
        ));

        self.connection = Some(Connection {
            id: connection_id,
            ready_state: ReadyState::Connecting,
            sink: None,
            reader,
        });
        self.publish_status();
    }

    async fn handle_event(&mut self, event: SocketEvent<C::Sink>) {
        match event {
            SocketEvent::Opened {
                connection_id,
                mut sink,
            } => match self.connection.as_mut() {
                Some(connection) if connection.id == connection_id => {
                    connection.ready_state = ReadyState::Open;
                    connection.sink = Some(sink);
                    self.reconnect.connection_opened();
                    info!("Socket opened (connection #{connection_id})");
                    self.publish_status();
                }
                _ => {
                    debug!("Closing socket of replaced connection #{connection_id}");
                    if let Err(e) = sink.close().await {
                        debug!("Closing replaced socket failed: {e}");
                    }
                }
            },
            SocketEvent::Frame {
                connection_id,
                frame,
            } => {
                if !self.is_current(connection_id) {
                    trace!("Dropping frame from replaced connection #{connection_id}");
                    return;
                }

                match decode(frame) {
                    Ok(message) => self.handler.on_message(message),
                    Err(e) if e.is_malformed() => {
                        warn!("Discarding frame on connection #{connection_id}: {e}")
                    }
                    Err(e) => error!("Frame on connection #{connection_id} not handled: {e}"),
                }
            }
            SocketEvent::Error {
                connection_id,
                error,
            } => {
                if self.is_current(connection_id) {
                    error!(
                        "Socket error ({}) on connection #{connection_id}: {error}",
                        error.error_category()
                    );
                } else {
                    debug!("Ignoring error from replaced connection #{connection_id}: {error}");
                }
            }
            SocketEvent::Closed { connection_id } => {
                if !self.is_current(connection_id) {
                    return;
                }

                if let Some(mut connection) = self.connection.take() {
                    connection.ready_state = ReadyState::Closed;
                    let closed = ConnectionError::transport_closed(connection.id);
                    info!("Socket closed ({}): {closed}", closed.error_category());
                    debug!("Connection #{} is {:?}", connection.id, connection.ready_state);
                }
                self.publish_status();
            }
        }
    }

    /// Keep an existing socket busy, or try to get one back.
    async fn on_keepalive_tick(&mut self) {
        if self.connection.is_some() {
            trace!("Keepalive tick, sending ping");
            self.write(Outbound::keepalive()).await;
        } else if self.reconnect.should_attempt(Instant::now()) {
            info!("Keepalive tick found no connection, reconnecting");
            self.open_connection();
        } else {
            debug!("Keepalive tick found no connection, reconnect deferred by backoff");
        }
    }

    /// Write one frame if the socket is open; otherwise drop it with a diagnostic.
    async fn write(&mut self, outbound: Outbound) {
        let status = self.status();
        let sink = self
            .connection
            .as_mut()
            .filter(|connection| connection.ready_state == ReadyState::Open)
            .and_then(|connection| connection.sink.as_mut());

        let Some(sink) = sink else {
            let rejected = ConnectionError::send_rejected(status);
            warn!("Dropping outbound frame ({}): {rejected}", rejected.error_category());
            return;
        };

        let text = match encode(&outbound) {
            Ok(text) => text,
            Err(e) => {
                error!("{e}");
                return;
            }
        };

        trace!("Sending frame: {text}");
        if let Err(e) = sink.send_text(text).await {
            error!("Socket error ({}) while sending: {e}", e.error_category());
        }
    }

    async fn shutdown(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            connection.ready_state = ReadyState::Closing;
            debug!("Connection #{} is {:?}", connection.id, connection.ready_state);
            if let Some(sink) = connection.sink.as_mut() {
                if let Err(e) = sink.close().await {
                    debug!("Closing socket during shutdown failed: {e}");
                }
            }
            connection.reader.abort();
        }

        self.publish_status();
        info!("Connection manager stopped");
    }
}

/// Connect, then forward every frame of one socket to the manager.
///
/// A failed connect is reported as an error followed by a close, the same
/// sequence a socket that drops after opening produces.
async fn run_connection<C: Connector>(
    connector: Arc<C>,
    url: String,
    connection_id: u64,
    events: mpsc::UnboundedSender<SocketEvent<C::Sink>>,
) {
    let (sink, mut source) = match connector.connect(&url).await {
        Ok(pair) => pair,
        Err(error) => {
            let _ = events.send(SocketEvent::Error {
                connection_id,
                error,
            });
            let _ = events.send(SocketEvent::Closed { connection_id });
            return;
        }
    };

    if events
        .send(SocketEvent::Opened {
            connection_id,
            sink,
        })
        .is_err()
    {
        return;
    }

    loop {
        match source.next_frame().await {
            Some(Ok(frame)) => {
                if events
                    .send(SocketEvent::Frame {
                        connection_id,
                        frame,
                    })
                    .is_err()
                {
                    return;
                }
            }
            Some(Err(error)) => {
                let _ = events.send(SocketEvent::Error {
                    connection_id,
                    error,
                });
                break;
            }
            None => break,
        }
    }

    let _ = events.send(SocketEvent::Closed { connection_id });
}
