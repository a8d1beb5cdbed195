//! Socket abstraction used by the connection manager.
//!
//! A [`Connector`] opens one duplex, message-framed socket and splits it into a
//! [`FrameSink`] (owned by the manager) and a [`FrameSource`] (drained by a reader
//! task). [`WebSocketConnector`] is the production implementation.

use crate::WEBSOCKET_SCHEME;
use crate::error::connection::ConnectionError;
use crate::protocol::RawFrame;

use std::future::Future;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use log::debug;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub trait Connector: Send + Sync + 'static {
    type Sink: FrameSink;
    type Source: FrameSource;

    /// Open a socket to `url` and complete its handshake.
    fn connect(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<(Self::Sink, Self::Source), ConnectionError>> + Send;
}

pub trait FrameSink: Send + 'static {
    fn send_text(&mut self, text: String)
    -> impl Future<Output = Result<(), ConnectionError>> + Send;

    fn close(&mut self) -> impl Future<Output = Result<(), ConnectionError>> + Send;
}

pub trait FrameSource: Send + 'static {
    /// Next data frame. `None` once the peer has closed the socket.
    fn next_frame(&mut self)
    -> impl Future<Output = Option<Result<RawFrame, ConnectionError>>> + Send;
}

/// Build the WebSocket URL for a configured server address.
///
/// `host:port` gets a `ws://` scheme. Explicit `ws://` URLs pass through.
///
/// # Errors
///
/// Returns [`ConnectionError::TransportUnavailable`] if the address does not parse,
/// has no host, or asks for a scheme this build cannot speak.
pub fn server_url(address: &str) -> Result<Url, ConnectionError> {
    let address = address.trim();
    let candidate = if address.contains("://") {
        address.to_string()
    } else {
        format!("{WEBSOCKET_SCHEME}{address}")
    };

    let url = Url::parse(&candidate).map_err(|e| {
        ConnectionError::transport_unavailable(address, format!("invalid address: {e}"))
    })?;

    match url.scheme() {
        "ws" => {}
        "wss" => {
            return Err(ConnectionError::transport_unavailable(
                address,
                "TLS sockets are not supported by this build",
            ));
        }
        other => {
            return Err(ConnectionError::transport_unavailable(
                address,
                format!("unsupported scheme '{other}', expected ws"),
            ));
        }
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(ConnectionError::transport_unavailable(
            address,
            "address has no host",
        ));
    }

    Ok(url)
}

/// Opens plain WebSocket connections with `tokio-tungstenite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

impl Connector for WebSocketConnector {
    type Sink = WebSocketSink;
    type Source = WebSocketSource;

    async fn connect(&self, url: &str) -> Result<(WebSocketSink, WebSocketSource), ConnectionError> {
        let (ws_stream, _response) = connect_async(url).await?;
        let (sink, stream) = ws_stream.split();
        Ok((WebSocketSink { sink }, WebSocketSource { stream }))
    }
}

pub struct WebSocketSink {
    sink: SplitSink<WsStream, Message>,
}

impl FrameSink for WebSocketSink {
    async fn send_text(&mut self, text: String) -> Result<(), ConnectionError> {
        self.sink
            .send(Message::Text(text.into()))
            .await
            .map_err(ConnectionError::from)
    }

    async fn close(&mut self) -> Result<(), ConnectionError> {
        self.sink.close().await.map_err(ConnectionError::from)
    }
}

pub struct WebSocketSource {
    stream: SplitStream<WsStream>,
}

impl FrameSource for WebSocketSource {
    async fn next_frame(&mut self) -> Option<Result<RawFrame, ConnectionError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(RawFrame::Text(text.as_str().to_owned()))),
                Ok(Message::Binary(data)) => return Some(Ok(RawFrame::Binary(data))),
                Ok(Message::Close(frame)) => {
                    debug!("Peer sent close frame: {frame:?}");
                    return None;
                }
                // Control frames are answered by tungstenite itself
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => continue,
                Err(e) => return Some(Err(ConnectionError::from(e))),
            }
        }
    }
}
