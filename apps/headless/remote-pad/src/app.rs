//! Headless controller: one connection, one router, commands from a line reader.

use crate::error::RemotePadError;
use crate::input::InputCommand;

use remote_core::config::ClientConfig;
use remote_core::connection::{
    ConnectionHandle, ConnectionManager, ConnectionStatus, WebSocketConnector,
};
use remote_core::router::{DisplayedImageReceiver, EncodedImage, MessageRouter, PassthroughDecoder};

use std::path::Path;

use log::{debug, error, info, warn};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::watch;

/// Load `remote-pad.json` from `config_dir` and apply environment overrides.
///
/// # Errors
///
/// Returns [`RemotePadError::Core`] if the file is corrupt or the final values
/// do not validate.
pub fn load_config(config_dir: &Path) -> Result<ClientConfig, RemotePadError> {
    let mut config = ClientConfig::load(config_dir)?;
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

/// Connect to the configured server and forward commands from `input` until
/// `quit` or end of input, then stop the connection.
///
/// # Errors
///
/// Returns an error if the server address is unusable, `input` fails, or the
/// connection manager stops underneath the controller.
pub async fn run<R>(config: &ClientConfig, input: R) -> Result<(), RemotePadError>
where
    R: AsyncBufRead + Unpin,
{
    let manager = ConnectionManager::new(
        WebSocketConnector,
        &config.server.address,
        &config.connection,
    )?;
    info!("Remote pad controlling {}", manager.url());

    let connection = manager.handle();
    let router = MessageRouter::new(
        connection.clone(),
        PassthroughDecoder,
        config.images.ordering,
    );

    let status_watcher = tokio::spawn(watch_status(connection.subscribe_status()));
    let image_watcher = tokio::spawn(watch_images(router.subscribe_images()));
    let manager_task = manager.start(router);

    let result = read_commands(input, &connection).await;

    if let Err(e) = connection.stop() {
        debug!("Connection manager already stopped: {e}");
    }
    if let Err(e) = manager_task.await {
        error!("Connection manager task failed: {e}");
    }
    status_watcher.abort();
    image_watcher.abort();

    result
}

async fn read_commands<R>(input: R, connection: &ConnectionHandle) -> Result<(), RemotePadError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();

    loop {
        let line = lines
            .next_line()
            .await
            .map_err(|e| RemotePadError::remote_pad(format!("Failed to read input: {e}")))?;

        let Some(line) = line else {
            info!("Input closed");
            return Ok(());
        };

        match InputCommand::parse(&line) {
            Ok(Some(InputCommand::Quit)) => {
                info!("Quit requested");
                return Ok(());
            }
            Ok(Some(command)) => {
                if connection.status() != ConnectionStatus::Connected {
                    warn!("Not connected, '{}' will be dropped", line.trim());
                }
                match command.apply(connection) {
                    Ok(()) => {}
                    Err(e) if e.is_fatal() => return Err(e.into()),
                    Err(e) => warn!(
                        "Command '{}' failed ({}): {e}",
                        line.trim(),
                        e.error_category()
                    ),
                }
            }
            Ok(None) => {}
            Err(e) => warn!("{e}"),
        }
    }
}

async fn watch_status(mut status_rx: watch::Receiver<ConnectionStatus>) {
    while status_rx.changed().await.is_ok() {
        let status = *status_rx.borrow_and_update();
        info!("Server {status}");
    }
}

async fn watch_images(mut images: DisplayedImageReceiver<EncodedImage>) {
    while images.changed().await.is_ok() {
        let shown = images.borrow_and_update().clone();
        if let Some(shown) = shown {
            info!(
                "Displaying image #{} ({}, {} bytes)",
                shown.sequence,
                shown.image.mime_type,
                shown.image.data.len()
            );
        }
    }
}
