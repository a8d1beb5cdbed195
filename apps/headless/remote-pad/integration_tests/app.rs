use remote_pad::app::{load_config, run};
use remote_pad::error::RemotePadError;

use remote_core::config::ClientConfig;

use std::time::Duration;

use futures_util::StreamExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::io::{AsyncWriteExt, BufReader, duplex};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, accept_async};

const WAIT: Duration = Duration::from_secs(5);

/// Test helper: Accept exactly one WebSocket client on an ephemeral port.
async fn start_test_server() -> (String, tokio::task::JoinHandle<WebSocketStream<TcpStream>>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test server");
    let address = listener.local_addr().unwrap().to_string();

    let accepted = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("Accept failed");
        accept_async(stream).await.expect("Handshake failed")
    });

    (address, accepted)
}

/// Test helper: Next client message that is not the keepalive.
async fn next_message(socket: &mut WebSocketStream<TcpStream>) -> Value {
    loop {
        let frame = timeout(WAIT, socket.next())
            .await
            .expect("Timed out waiting for client frame")
            .expect("Client closed the socket")
            .expect("Error reading client frame");

        if let Message::Text(text) = frame {
            if text.as_str() != "\"ping\"" {
                return serde_json::from_str(text.as_str()).expect("Client sent invalid JSON");
            }
        }
    }
}

/// **VALUE**: Verifies typed commands reach the server and `quit` ends the controller.
///
/// **WHY THIS MATTERS**: This is the whole headless path: line reader, parser, connection
/// handle, manager and socket, then a clean shutdown.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - `tap` sends only the key-down
/// - Invalid lines abort the controller instead of being skipped
/// - `quit` leaves the manager task running so `run` never returns
#[tokio::test]
async fn given_running_controller_when_commands_typed_then_server_receives_them() {
    // GIVEN: A test server and a controller reading from an in-memory pipe
    let (address, accepted) = start_test_server().await;
    let mut config = ClientConfig::default();
    config.server.address = address;
    let (mut keyboard, input) = duplex(1024);
    let controller = tokio::spawn(async move { run(&config, BufReader::new(input)).await });
    let mut socket = timeout(WAIT, accepted).await.unwrap().unwrap();

    // Give the manager time to see the socket open
    tokio::time::sleep(Duration::from_millis(200)).await;

    // WHEN: The user types a tap, a bad line, an image request and quit
    keyboard
        .write_all(b"tap W\nfly away\nimage\nquit\n")
        .await
        .unwrap();

    // THEN: The server sees down, up, then the image request
    assert_eq!(
        next_message(&mut socket).await,
        json!({"type": 2, "key": {"keysym": {"sym": 119}}})
    );
    assert_eq!(
        next_message(&mut socket).await,
        json!({"type": 3, "key": {"keysym": {"sym": 119}}})
    );
    assert_eq!(next_message(&mut socket).await, json!({"type": 1000}));

    // THEN: And the controller exits cleanly
    let result = timeout(WAIT, controller)
        .await
        .expect("Controller did not stop")
        .expect("Controller panicked");
    assert!(result.is_ok(), "Controller failed: {:?}", result.err());
}

/// **VALUE**: Verifies an unusable server address is reported before any input is read.
#[tokio::test]
async fn given_http_address_when_run_then_core_error() {
    let mut config = ClientConfig::default();
    config.server.address = "http://localhost:8080".to_string();

    let result = run(&config, BufReader::new(&b"tap w\n"[..])).await;

    assert!(matches!(result, Err(RemotePadError::Core { .. })));
}

/// **VALUE**: Verifies the controller reads its config file from the given directory.
///
/// **WHY THIS MATTERS**: Users point the pad at their render box by editing this file.
#[test]
fn given_config_file_when_loaded_then_address_used() {
    // GIVEN: A config directory with a custom address
    let dir = TempDir::new().unwrap();
    let mut config = ClientConfig::default();
    config.server.address = "render-box:9000".to_string();
    config.save(dir.path()).unwrap();

    // WHEN: Loading it the way main does
    let loaded = load_config(dir.path()).unwrap();

    // THEN: The saved address is used, unless the environment overrides it
    if std::env::var("REMOTE_PAD_SERVER_ADDRESS").is_err() {
        assert_eq!(loaded.server.address, "render-box:9000");
    }
}
