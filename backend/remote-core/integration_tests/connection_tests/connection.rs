use crate::connection_tests::helpers::{
    PING_TEXT, WAIT, connection_config, next_message, next_socket, next_text, start_test_server,
    unused_address, wait_for_status,
};

use remote_core::config::ImageOrdering;
use remote_core::connection::{ConnectionManager, ConnectionStatus, WebSocketConnector, start};
use remote_core::error::ConnectionError;
use remote_core::protocol::{Message, MessageType, encode_binary};
use remote_core::router::{MessageRouter, PassthroughDecoder};

use std::time::Duration;

use bytes::Bytes;
use futures_util::SinkExt;
use serde_json::json;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::Message as WsMessage;

/// **VALUE**: Verifies key events reach a real WebSocket server as JSON text, followed by the
/// keepalive.
///
/// **WHY THIS MATTERS**: This is the pad's whole output path: handle, manager task, codec,
/// tungstenite sink. Unit tests cover each piece against a mock socket only.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - Text frames are sent as binary
/// - The keepalive timer is not armed on a real socket
/// - The handshake URL is built wrong for a `host:port` address
#[tokio::test]
async fn given_connected_client_when_key_pressed_then_server_receives_key_event_and_ping() {
    // GIVEN: A test server and a manager with a short keepalive
    let mut server = start_test_server().await;
    let manager =
        ConnectionManager::new(WebSocketConnector, &server.address, &connection_config(200))
            .expect("Test server address should be usable");
    let handle = manager.handle();
    let task = manager.start(|_message: Message| {});
    let mut socket = next_socket(&mut server).await;
    wait_for_status(&handle, ConnectionStatus::Connected).await;

    // WHEN: The user presses and releases W
    handle.send_key_down('W').unwrap();
    handle.send_key_up('W').unwrap();

    // THEN: The server receives both events in order
    assert_eq!(
        next_message(&mut socket).await,
        json!({"type": 2, "key": {"keysym": {"sym": 119}}})
    );
    assert_eq!(
        next_message(&mut socket).await,
        json!({"type": 3, "key": {"keysym": {"sym": 119}}})
    );

    // THEN: And the keepalive arrives as the JSON string
    assert_eq!(next_text(&mut socket).await, PING_TEXT);

    handle.stop().unwrap();
    timeout(WAIT, task).await.unwrap().unwrap();
}

/// **VALUE**: Verifies an IMAGE sent as a binary frame is displayed and answered with
/// SEND_IMAGE over a real socket.
///
/// **WHY THIS MATTERS**: This is the image pipeline end to end: binary decode, router,
/// off-thread decode, displayed-image slot and the request for the next frame.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - tungstenite binary frames are not passed to the binary decoder
/// - The router never requests the next image
/// - The decoded image is not published to subscribers
#[tokio::test]
async fn given_router_when_server_sends_binary_image_then_displayed_and_next_requested() {
    // GIVEN: A manager driving a router with the passthrough decoder
    let mut server = start_test_server().await;
    let manager =
        ConnectionManager::new(WebSocketConnector, &server.address, &connection_config(60_000))
            .unwrap();
    let handle = manager.handle();
    let router = MessageRouter::new(
        handle.clone(),
        PassthroughDecoder,
        ImageOrdering::LastReceivedWins,
    );
    let mut images = router.subscribe_images();
    let task = manager.start(router);
    let mut socket = next_socket(&mut server).await;
    wait_for_status(&handle, ConnectionStatus::Connected).await;

    // WHEN: The server pushes a PNG
    let header = Message::new(MessageType::Image).with_field("mimeType", "image/png");
    let frame = encode_binary(&header, b"\x89PNG\r\n").unwrap();
    socket.send(WsMessage::Binary(frame)).await.unwrap();

    // THEN: The client asks for the next image
    assert_eq!(next_message(&mut socket).await, json!({"type": 1000}));

    // THEN: And the image becomes the displayed one
    timeout(WAIT, images.changed()).await.unwrap().unwrap();
    let shown = images.borrow().clone().expect("Image should be displayed");
    assert_eq!(shown.sequence, 1);
    assert_eq!(shown.image.mime_type, "image/png");
    assert_eq!(shown.image.data, Bytes::from_static(b"\x89PNG\r\n"));

    handle.stop().unwrap();
    timeout(WAIT, task).await.unwrap().unwrap();
}

/// **VALUE**: Verifies the client reconnects after the server drops it.
///
/// **WHY THIS MATTERS**: Server restarts are routine. The pad has no reconnect button; the
/// keepalive tick is the only way back.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - A server close is not noticed and status stays Connected
/// - The tick does not open a new socket after the old one is gone
#[tokio::test]
async fn given_connected_client_when_server_drops_socket_then_client_reconnects() {
    // GIVEN: A connected client
    let mut server = start_test_server().await;
    let manager =
        ConnectionManager::new(WebSocketConnector, &server.address, &connection_config(200))
            .unwrap();
    let handle = manager.handle();
    let task = manager.start(|_message: Message| {});
    let mut first = next_socket(&mut server).await;
    wait_for_status(&handle, ConnectionStatus::Connected).await;
    let mut status_rx = handle.subscribe_status();

    // WHEN: The server closes the socket
    first.close(None).await.unwrap();
    drop(first);

    // THEN: The client notices, then connects again
    timeout(WAIT, status_rx.wait_for(|status| *status != ConnectionStatus::Connected))
        .await
        .expect("Client never noticed the close")
        .unwrap();
    let mut second = next_socket(&mut server).await;
    wait_for_status(&handle, ConnectionStatus::Connected).await;

    // THEN: The new socket carries traffic
    handle.request_image().unwrap();
    assert_eq!(next_message(&mut second).await, json!({"type": 1000}));

    handle.stop().unwrap();
    timeout(WAIT, task).await.unwrap().unwrap();
}

/// **VALUE**: Verifies an address that cannot be a WebSocket URL fails `start` immediately.
///
/// **WHY THIS MATTERS**: This is the one error a caller of `start` must handle; everything
/// else recovers on its own.
#[tokio::test]
async fn given_invalid_address_when_started_then_transport_unavailable() {
    let result = start("http://localhost:8080", |_message: Message| {});

    match result {
        Err(error @ ConnectionError::TransportUnavailable { .. }) => assert!(error.is_fatal()),
        Err(other) => panic!("Expected TransportUnavailable, got {other}"),
        Ok(_) => panic!("An http address must be rejected"),
    }
}

/// **VALUE**: Verifies a client pointed at a dead port keeps running without connecting, and
/// still stops cleanly.
///
/// **WHY THIS MATTERS**: The pad is often started before the rendering server. Refused
/// connections must not end the manager, and sends in the meantime must not pile up.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - A refused connect is treated as fatal
/// - The manager claims Connected without a server
/// - Stop hangs while a connect attempt is in flight
#[tokio::test]
async fn given_no_server_when_started_then_keeps_retrying_until_stopped() {
    // GIVEN: An address with no listener
    let address = unused_address().await;
    let manager =
        ConnectionManager::new(WebSocketConnector, &address, &connection_config(100)).unwrap();
    let handle = manager.handle();
    let task = manager.start(|_message: Message| {});

    // WHEN: Several keepalive intervals pass, with a send in between
    sleep(Duration::from_millis(250)).await;
    handle.send_key_down('a').unwrap();
    sleep(Duration::from_millis(250)).await;

    // THEN: The manager is still running and not connected
    assert!(handle.is_running());
    assert_ne!(handle.status(), ConnectionStatus::Connected);

    // THEN: And it stops on request
    handle.stop().unwrap();
    timeout(WAIT, task)
        .await
        .expect("Manager did not stop")
        .expect("Manager task panicked");
    assert_eq!(handle.status(), ConnectionStatus::Disconnected);
}
