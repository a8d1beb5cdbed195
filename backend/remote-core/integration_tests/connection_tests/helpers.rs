//! Test helpers for connection integration tests.
//!
//! This module provides a minimal rendering-server stand-in:
//! - Accepting WebSocket connections on an ephemeral port
//! - Reading client text frames as JSON, with keepalives filtered out
//! - Waiting on manager status with a timeout

use remote_core::config::{ConnectionConfig, ReconnectPolicy};
use remote_core::connection::{ConnectionHandle, ConnectionStatus};

use std::time::Duration;

use futures_util::StreamExt;
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, accept_async};

pub type ServerSocket = WebSocketStream<TcpStream>;

/// Upper bound for anything a test waits on.
pub const WAIT: Duration = Duration::from_secs(5);

/// Wire form of the keepalive.
pub const PING_TEXT: &str = "\"ping\"";

pub struct TestServer {
    pub address: String,
    pub sockets_rx: mpsc::UnboundedReceiver<ServerSocket>,
    _accept_task: JoinHandle<()>,
}

/// Test helper: Start a WebSocket server on 127.0.0.1 with an ephemeral port.
///
/// Every completed handshake is handed to the test through `sockets_rx`.
pub async fn start_test_server() -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test server");
    let address = listener
        .local_addr()
        .expect("Test server has no address")
        .to_string();

    let (sockets_tx, sockets_rx) = mpsc::unbounded_channel();
    let accept_task = tokio::spawn(async move {
        while let Ok((stream, _peer)) = listener.accept().await {
            match accept_async(stream).await {
                Ok(socket) => {
                    if sockets_tx.send(socket).is_err() {
                        return;
                    }
                }
                Err(e) => eprintln!("Test server handshake failed: {e}"),
            }
        }
    });

    TestServer {
        address,
        sockets_rx,
        _accept_task: accept_task,
    }
}

/// Test helper: An address nothing is listening on.
pub async fn unused_address() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind probe listener");
    let address = listener
        .local_addr()
        .expect("Probe listener has no address")
        .to_string();
    drop(listener);
    address
}

pub fn connection_config(keepalive_interval_ms: u64) -> ConnectionConfig {
    ConnectionConfig {
        keepalive_interval_ms,
        reconnect: ReconnectPolicy::Fixed,
    }
}

/// Test helper: Wait for the next accepted client socket.
pub async fn next_socket(server: &mut TestServer) -> ServerSocket {
    timeout(WAIT, server.sockets_rx.recv())
        .await
        .expect("Timed out waiting for client connection")
        .expect("Accept loop ended")
}

/// Test helper: Read the next text frame from the client.
pub async fn next_text(socket: &mut ServerSocket) -> String {
    loop {
        let frame = timeout(WAIT, socket.next())
            .await
            .expect("Timed out waiting for client frame")
            .expect("Client closed the socket")
            .expect("Error reading client frame");

        match frame {
            Message::Text(text) => return text.as_str().to_owned(),
            Message::Binary(_) => panic!("Client must only send text frames"),
            _ => continue,
        }
    }
}

/// Test helper: Read the next client message that is not a keepalive.
pub async fn next_message(socket: &mut ServerSocket) -> Value {
    loop {
        let text = next_text(socket).await;
        if text != PING_TEXT {
            return serde_json::from_str(&text).expect("Client sent invalid JSON");
        }
    }
}

pub async fn wait_for_status(handle: &ConnectionHandle, status: ConnectionStatus) {
    timeout(WAIT, handle.wait_for_status(status))
        .await
        .expect("Timed out waiting for status")
        .expect("Manager stopped while waiting for status");
}
