//! Connection manager: one self-healing socket to the rendering server.
//!
//! The manager opens a socket on [`ConnectionManager::start`], decodes every
//! inbound frame and passes the result to a [`MessageHandler`]. A timer fires
//! every keepalive interval (2 s by default):
//!
//! - with a socket present it sends the keepalive `"ping"`
//! - with no socket it opens a new one
//!
//! Closing is passive: a closed socket is dropped and the next tick reconnects.
//! Sends while not connected are dropped with a diagnostic, never queued.

mod handle;
mod handler;
mod manager;
pub(crate) mod reconnect;
mod status;
pub mod transport;

pub use handle::ConnectionHandle;
#[cfg(test)]
pub(crate) use handle::Command;
pub use handler::MessageHandler;
pub use manager::ConnectionManager;
pub use status::{ConnectionStatus, ReadyState};
pub use transport::{Connector, FrameSink, FrameSource, WebSocketConnector};

use crate::config::ConnectionConfig;
use crate::error::connection::ConnectionError;

use tokio::task::JoinHandle;

/// Connect to `address` over WebSocket with the default keepalive settings and
/// deliver decoded messages to `on_message`.
///
/// Must be called inside a tokio runtime.
///
/// # Errors
///
/// Returns [`ConnectionError::TransportUnavailable`] if `address` cannot be
/// turned into a WebSocket URL.
///
/// # Examples
///
/// ```no_run
/// use remote_core::connection::start;
/// use remote_core::protocol::Message;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let (handle, task) = start("localhost:8080", |message: Message| {
///         println!("received type {}", message.type_code());
///     })?;
///     handle.send_key_down('w')?;
///     handle.stop()?;
///     task.await?;
///     Ok(())
/// }
/// ```
pub fn start<H: MessageHandler>(
    address: &str,
    on_message: H,
) -> Result<(ConnectionHandle, JoinHandle<()>), ConnectionError> {
    let manager = ConnectionManager::new(WebSocketConnector, address, &ConnectionConfig::default())?;
    let handle = manager.handle();
    let task = manager.start(on_message);
    Ok((handle, task))
}
