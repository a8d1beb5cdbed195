use crate::connection::ConnectionStatus;
use crate::error::connection::ConnectionError;
use crate::protocol::{Message, Outbound};

use tokio::sync::{mpsc, watch};

/// Requests handled by the manager task.
#[derive(Debug)]
pub(crate) enum Command {
    Send(Outbound),
    Stop,
}

/// Cheap, cloneable handle to a [`ConnectionManager`](crate::connection::ConnectionManager).
///
/// Sends are fire-and-forget: a message is written only if the socket is open when
/// the manager gets to it, otherwise it is dropped and logged. The only error a
/// caller sees is [`ConnectionError::ManagerStopped`].
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    command_tx: mpsc::UnboundedSender<Command>,
    status_rx: watch::Receiver<ConnectionStatus>,
}

impl ConnectionHandle {
    pub(crate) fn new(
        command_tx: mpsc::UnboundedSender<Command>,
        status_rx: watch::Receiver<ConnectionStatus>,
    ) -> Self {
        Self {
            command_tx,
            status_rx,
        }
    }

    pub fn send(&self, message: Message) -> Result<(), ConnectionError> {
        self.send_outbound(Outbound::Message(message))
    }

    pub fn send_outbound(&self, outbound: Outbound) -> Result<(), ConnectionError> {
        self.command_tx
            .send(Command::Send(outbound))
            .map_err(|_| ConnectionError::manager_stopped())
    }

    pub fn send_key_down(&self, key: char) -> Result<(), ConnectionError> {
        self.send(Message::key_down(key))
    }

    pub fn send_key_up(&self, key: char) -> Result<(), ConnectionError> {
        self.send(Message::key_up(key))
    }

    /// Ask the server to start preparing the next image.
    pub fn request_image(&self) -> Result<(), ConnectionError> {
        self.send(Message::send_image())
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.status_rx.borrow()
    }

    /// Receiver that wakes on every status transition.
    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_rx.clone()
    }

    /// Resolve once the manager reports `status`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::ManagerStopped`] if the manager ends first.
    pub async fn wait_for_status(&self, status: ConnectionStatus) -> Result<(), ConnectionError> {
        let mut status_rx = self.status_rx.clone();
        status_rx
            .wait_for(|current| *current == status)
            .await
            .map(|_| ())
            .map_err(|_| ConnectionError::manager_stopped())
    }

    /// Close the socket and end the manager task.
    pub fn stop(&self) -> Result<(), ConnectionError> {
        self.command_tx
            .send(Command::Stop)
            .map_err(|_| ConnectionError::manager_stopped())
    }

    pub fn is_running(&self) -> bool {
        !self.command_tx.is_closed()
    }
}
