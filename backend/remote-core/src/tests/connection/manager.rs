// Unit tests for the connection manager state machine.
// Socket behaviour over real WebSockets is covered in integration_tests/connection.rs

use crate::config::{ConnectionConfig, ReconnectPolicy};
use crate::connection::{ConnectionManager, ConnectionStatus};
use crate::error::connection::ConnectionError;
use crate::protocol::{Message, MessageType, RawFrame, encode_binary};
use crate::tests::mock_transport::{
    MockConnector, WAIT, eventually, next_peer, wait_for_status,
};

use std::time::Duration;

use bytes::Bytes;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};

const ADDRESS: &str = "localhost:8080";

fn config(keepalive_interval_ms: u64) -> ConnectionConfig {
    ConnectionConfig {
        keepalive_interval_ms,
        reconnect: ReconnectPolicy::Fixed,
    }
}

/// **VALUE**: Verifies that a send on an open connection produces exactly one transport write
/// with the key event encoded as JSON text.
///
/// **WHY THIS MATTERS**: Every key press on the pad goes through this path. A duplicate write
/// would make the server see a double key press; a missing write loses input.
///
/// **BUG THIS CATCHES**: Would catch if sends were queued twice, written in the binary form,
/// or if the key event shape drifted from `{type, key: {keysym: {sym}}}`.
#[tokio::test]
async fn given_open_connection_when_key_down_sent_then_exactly_one_write() {
    // GIVEN: A connected manager with a keepalive too slow to interfere
    let (connector, mut peers_rx) = MockConnector::new();
    let manager = ConnectionManager::new(connector, ADDRESS, &config(60_000)).unwrap();
    let handle = manager.handle();
    let _task = manager.start(|_message: Message| {});
    let mut peer = next_peer(&mut peers_rx).await;
    wait_for_status(&handle, ConnectionStatus::Connected).await;

    // WHEN: Sending a key-down for 'W'
    handle.send_key_down('W').unwrap();

    // THEN: One JSON text frame with the lower-case keysym is written
    let written = timeout(WAIT, peer.writes_rx.recv())
        .await
        .expect("Timed out waiting for write")
        .expect("Sink dropped");
    let value: Value = serde_json::from_str(&written).unwrap();
    assert_eq!(value, json!({"type": 2, "key": {"keysym": {"sym": 119}}}));

    // THEN: And nothing else follows
    sleep(Duration::from_millis(100)).await;
    assert!(peer.writes_rx.try_recv().is_err(), "Expected exactly one write");

    handle.stop().unwrap();
}

/// **VALUE**: Verifies that sends made while disconnected are dropped, not queued for later.
///
/// **WHY THIS MATTERS**: Delivery is at-most-once per call. Replaying stale key presses after a
/// reconnect would move the remote camera without the user touching the pad.
///
/// **BUG THIS CATCHES**: Would catch a send buffer that flushes on reconnect.
#[tokio::test]
async fn given_refused_connection_when_message_sent_then_not_delivered_after_reconnect() {
    // GIVEN: A manager whose first connection attempt is refused
    let (connector, mut peers_rx) = MockConnector::new();
    connector.refuse_connections(true);
    let manager = ConnectionManager::new(connector.clone(), ADDRESS, &config(200)).unwrap();
    let handle = manager.handle();
    let _task = manager.start(|_message: Message| {});
    eventually(|| {
        connector.attempts() >= 1 && handle.status() == ConnectionStatus::Disconnected
    })
    .await;

    // WHEN: Sending while disconnected, then letting the server accept again
    handle.send_key_down('a').unwrap();
    connector.refuse_connections(false);
    let mut peer = next_peer(&mut peers_rx).await;
    wait_for_status(&handle, ConnectionStatus::Connected).await;

    // THEN: The new socket only ever sees keepalive pings
    sleep(Duration::from_millis(300)).await;
    while let Ok(written) = peer.writes_rx.try_recv() {
        assert_eq!(written, "\"ping\"", "Dropped message was replayed: {written}");
    }

    handle.stop().unwrap();
}

/// **VALUE**: Verifies that a send made while the handshake is still running is dropped, and
/// that keepalive ticks during the handshake neither queue pings nor open a second socket.
///
/// **WHY THIS MATTERS**: A slow server leaves the manager in Connecting for several ticks. A key
/// press in that window must not be replayed once the socket opens, and each tick must not
/// start yet another handshake.
///
/// **BUG THIS CATCHES**: Would catch a write path that buffers until `Open`, or a tick that
/// treats a pending connection as missing.
#[tokio::test]
async fn given_handshake_in_progress_when_key_sent_then_dropped_and_no_second_attempt() {
    // GIVEN: A connector whose handshake spans several keepalive ticks
    let (connector, mut peers_rx) = MockConnector::new();
    connector.set_handshake_delay(Duration::from_millis(350));
    let manager = ConnectionManager::new(connector.clone(), ADDRESS, &config(100)).unwrap();
    let handle = manager.handle();
    let _task = manager.start(|_message: Message| {});
    wait_for_status(&handle, ConnectionStatus::Connecting).await;

    // WHEN: Sending while the socket is still connecting
    handle.send_key_down('w').unwrap();

    // THEN: The socket opens from the first and only attempt
    let mut peer = next_peer(&mut peers_rx).await;
    wait_for_status(&handle, ConnectionStatus::Connected).await;
    assert_eq!(connector.attempts(), 1, "Ticks during the handshake must not reconnect");

    // THEN: Only keepalives written after the open reach the server
    sleep(Duration::from_millis(250)).await;
    while let Ok(written) = peer.writes_rx.try_recv() {
        assert_eq!(written, "\"ping\"", "Send from Connecting was delivered: {written}");
    }
    assert_eq!(connector.attempts(), 1);

    handle.stop().unwrap();
}

/// **VALUE**: Verifies that a server-side close moves the manager to Disconnected.
///
/// **WHY THIS MATTERS**: The status indicator is the only error surface the user sees. It must
/// not keep saying "connected" after the server went away.
///
/// **BUG THIS CATCHES**: Would catch if the close event were ignored or the connection
/// reference kept after closing.
#[tokio::test]
async fn given_open_connection_when_peer_closes_then_status_disconnected() {
    // GIVEN: A connected manager that will not reconnect within the test
    let (connector, mut peers_rx) = MockConnector::new();
    let manager = ConnectionManager::new(connector, ADDRESS, &config(60_000)).unwrap();
    let handle = manager.handle();
    let _task = manager.start(|_message: Message| {});
    let peer = next_peer(&mut peers_rx).await;
    wait_for_status(&handle, ConnectionStatus::Connected).await;

    // WHEN: The server closes the socket
    drop(peer.frames_tx);

    // THEN: The manager reports Disconnected
    wait_for_status(&handle, ConnectionStatus::Disconnected).await;

    handle.stop().unwrap();
}

/// **VALUE**: Verifies that after a close the manager reconnects exactly once within one
/// keepalive interval.
///
/// **WHY THIS MATTERS**: Reconnection is the system's only recovery path. Too few attempts
/// leave the pad dead; too many open parallel sockets the server has to juggle.
///
/// **BUG THIS CATCHES**: Would catch an immediate reconnect on close racing with the tick, or
/// ticks reconnecting while a connection already exists.
#[tokio::test]
async fn given_closed_connection_when_keepalive_ticks_then_reconnects_once() {
    // GIVEN: A connected manager with a short keepalive
    let (connector, mut peers_rx) = MockConnector::new();
    let manager = ConnectionManager::new(connector.clone(), ADDRESS, &config(150)).unwrap();
    let handle = manager.handle();
    let _task = manager.start(|_message: Message| {});
    let first = next_peer(&mut peers_rx).await;
    wait_for_status(&handle, ConnectionStatus::Connected).await;

    // WHEN: The server closes the socket
    drop(first.frames_tx);

    // THEN: A second connection arrives within the wait window
    let _second = next_peer(&mut peers_rx).await;
    wait_for_status(&handle, ConnectionStatus::Connected).await;

    // THEN: And no further attempts follow while it stays open
    sleep(Duration::from_millis(500)).await;
    assert_eq!(connector.attempts(), 2, "Expected exactly one reconnect");
    assert!(peers_rx.try_recv().is_err());

    handle.stop().unwrap();
}

/// **VALUE**: Verifies that an open connection receives the bare `"ping"` keepalive.
///
/// **WHY THIS MATTERS**: Intermediaries that drop idle sockets only see traffic if the client
/// sends some. The server expects the JSON string, not a wrapped message.
///
/// **BUG THIS CATCHES**: Would catch the timer not being armed or the ping being wrapped.
#[tokio::test]
async fn given_open_connection_when_keepalive_ticks_then_ping_written() {
    // GIVEN: A connected manager with a short keepalive
    let (connector, mut peers_rx) = MockConnector::new();
    let manager = ConnectionManager::new(connector, ADDRESS, &config(100)).unwrap();
    let handle = manager.handle();
    let _task = manager.start(|_message: Message| {});
    let mut peer = next_peer(&mut peers_rx).await;
    wait_for_status(&handle, ConnectionStatus::Connected).await;

    // WHEN: Waiting for the next tick
    let written = timeout(WAIT, peer.writes_rx.recv())
        .await
        .expect("Timed out waiting for keepalive")
        .expect("Sink dropped");

    // THEN: The keepalive is the JSON string "ping"
    assert_eq!(written, "\"ping\"");

    handle.stop().unwrap();
}

/// **VALUE**: Verifies that a malformed frame is discarded without closing the connection and
/// later frames still reach the handler.
///
/// **WHY THIS MATTERS**: One bad frame from the server must not cost the user their session.
///
/// **BUG THIS CATCHES**: Would catch decode errors propagating out of the manager loop or
/// tearing down the socket.
#[tokio::test]
async fn given_malformed_frame_when_received_then_discarded_and_connection_kept() {
    // GIVEN: A connected manager forwarding messages to a channel
    let (connector, mut peers_rx) = MockConnector::new();
    let (received_tx, mut received_rx) = mpsc::unbounded_channel();
    let manager = ConnectionManager::new(connector, ADDRESS, &config(60_000)).unwrap();
    let handle = manager.handle();
    let _task = manager.start(move |message: Message| {
        let _ = received_tx.send(message);
    });
    let peer = next_peer(&mut peers_rx).await;
    wait_for_status(&handle, ConnectionStatus::Connected).await;

    // WHEN: The server sends garbage, then a valid comment
    peer.frames_tx
        .send(RawFrame::Text("not json".to_string()))
        .unwrap();
    peer.frames_tx
        .send(RawFrame::Text(r#"{"type":0,"value":"hello"}"#.to_string()))
        .unwrap();

    // THEN: Only the valid message is delivered and the socket stays open
    let message = timeout(WAIT, received_rx.recv()).await.unwrap().unwrap();
    assert_eq!(message.message_type(), Some(MessageType::Comment));
    assert_eq!(message.value(), Some("hello"));
    assert_eq!(handle.status(), ConnectionStatus::Connected);

    handle.stop().unwrap();
}

/// **VALUE**: Verifies that binary frames reach the handler with their trailing payload attached.
///
/// **WHY THIS MATTERS**: Images arrive as binary frames. If the payload is lost between the
/// transport and the handler, every image fails to decode.
///
/// **BUG THIS CATCHES**: Would catch the manager decoding binary frames as text or dropping `data`.
#[tokio::test]
async fn given_binary_frame_when_received_then_handler_gets_payload() {
    // GIVEN: A connected manager forwarding messages to a channel
    let (connector, mut peers_rx) = MockConnector::new();
    let (received_tx, mut received_rx) = mpsc::unbounded_channel();
    let manager = ConnectionManager::new(connector, ADDRESS, &config(60_000)).unwrap();
    let handle = manager.handle();
    let _task = manager.start(move |message: Message| {
        let _ = received_tx.send(message);
    });
    let peer = next_peer(&mut peers_rx).await;
    wait_for_status(&handle, ConnectionStatus::Connected).await;

    // WHEN: The server sends an IMAGE as a binary frame
    let header = Message::new(MessageType::Image).with_field("mimeType", "image/png");
    let frame = encode_binary(&header, &[0x89, b'P', b'N', b'G']).unwrap();
    peer.frames_tx.send(RawFrame::Binary(frame)).unwrap();

    // THEN: The handler sees the header fields and the payload
    let message = timeout(WAIT, received_rx.recv()).await.unwrap().unwrap();
    assert_eq!(message.mime_type(), Some("image/png"));
    assert_eq!(message.data(), Some(&Bytes::from_static(&[0x89, b'P', b'N', b'G'])));

    handle.stop().unwrap();
}

/// **VALUE**: Verifies that stop ends the task, reports Disconnected and makes later sends fail
/// with `ManagerStopped`.
///
/// **WHY THIS MATTERS**: Without an explicit shutdown the manager would retry forever, which
/// leaks tasks in tests and in any host that restarts the client.
///
/// **BUG THIS CATCHES**: Would catch stop leaving the reader or timer running.
#[tokio::test]
async fn given_running_manager_when_stopped_then_task_ends_and_sends_fail() {
    // GIVEN: A connected manager
    let (connector, mut peers_rx) = MockConnector::new();
    let manager = ConnectionManager::new(connector, ADDRESS, &config(60_000)).unwrap();
    let handle = manager.handle();
    let task = manager.start(|_message: Message| {});
    let _peer = next_peer(&mut peers_rx).await;
    wait_for_status(&handle, ConnectionStatus::Connected).await;

    // WHEN: Stopping it
    handle.stop().unwrap();
    timeout(WAIT, task)
        .await
        .expect("Manager did not stop")
        .expect("Manager task panicked");

    // THEN: Status is Disconnected and sends report the stopped manager
    assert_eq!(handle.status(), ConnectionStatus::Disconnected);
    assert!(!handle.is_running());
    let result = handle.send(Message::send_image());
    assert!(matches!(result, Err(ConnectionError::ManagerStopped { .. })));
}

/// **VALUE**: Verifies that an address no WebSocket URL can be built from is a fatal
/// `TransportUnavailable`, reported before anything is spawned.
///
/// **WHY THIS MATTERS**: Retrying an impossible address every two seconds forever would hide
/// a configuration mistake behind a "connecting..." indicator.
///
/// **BUG THIS CATCHES**: Would catch address validation being deferred to the connect attempt.
#[test]
fn given_unusable_address_when_manager_created_then_transport_unavailable() {
    // GIVEN: Addresses with the wrong scheme, TLS, or no host
    for address in ["http://localhost:8080", "wss://localhost:8080", "ws://"] {
        let (connector, _peers_rx) = MockConnector::new();

        // WHEN: Creating a manager
        let result = ConnectionManager::new(connector, address, &config(2000));

        // THEN: It fails fatally
        match result {
            Err(error) => {
                assert!(
                    matches!(error, ConnectionError::TransportUnavailable { .. }),
                    "Unexpected error for {address}: {error}"
                );
                assert!(error.is_fatal());
            }
            Ok(_) => panic!("Address should be rejected: {address}"),
        }
    }
}
