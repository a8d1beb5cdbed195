// Unit tests for building the server URL from a configured address

use crate::DEFAULT_SERVER_ADDRESS;
use crate::DEFAULT_SERVER_URL;
use crate::connection::transport::server_url;
use crate::error::connection::ConnectionError;

/// **VALUE**: Verifies a plain `host:port` address gets the `ws://` scheme.
///
/// **WHY THIS MATTERS**: The configured default is `localhost:8080`, with no scheme.
///
/// **BUG THIS CATCHES**: Would catch the address being parsed as `localhost` scheme with
/// path `8080`.
#[test]
fn given_host_and_port_when_server_url_then_ws_scheme_added() {
    let url = server_url(DEFAULT_SERVER_ADDRESS).unwrap();

    assert_eq!(url.as_str(), format!("{DEFAULT_SERVER_URL}/"));
    assert_eq!(url.host_str(), Some("localhost"));
    assert_eq!(url.port(), Some(8080));
}

#[test]
fn given_explicit_ws_url_when_server_url_then_kept() {
    let url = server_url("  ws://10.0.0.5:9000/pad ").unwrap();

    assert_eq!(url.as_str(), "ws://10.0.0.5:9000/pad");
}

/// **VALUE**: Verifies addresses that cannot become a plain WebSocket URL are
/// `TransportUnavailable`.
///
/// **BUG THIS CATCHES**: Would catch `http://` slipping through to the handshake, where it
/// would fail on every tick forever.
#[test]
fn given_unusable_addresses_when_server_url_then_transport_unavailable() {
    for address in [
        "",
        "ws://",
        "http://localhost:8080",
        "wss://localhost:8080",
        "localhost:notaport",
    ] {
        let result = server_url(address);
        assert!(
            matches!(result, Err(ConnectionError::TransportUnavailable { .. })),
            "Address {address:?} should be unavailable, got {result:?}"
        );
    }
}
