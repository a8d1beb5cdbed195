//! Error types for the connection manager.
//!
//! Only [`ConnectionError::TransportUnavailable`] is ever returned to a caller as a
//! startup failure. Everything else is handled where it occurs: logged, and then
//! the manager falls back to "disconnected" until the next keepalive tick.

use crate::connection::ConnectionStatus;

use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ConnectionError {
    #[error("Transport Unavailable Error: cannot reach '{address}': {message} {location}")]
    TransportUnavailable {
        address: String,
        message: String,
        location: ErrorLocation,
    },

    #[error("Transport Error: {message} {location}")]
    TransportError {
        message: String,
        location: ErrorLocation,
    },

    #[error("Transport Closed Error: connection #{connection_id} closed {location}")]
    TransportClosed {
        connection_id: u64,
        location: ErrorLocation,
    },

    #[error("Send Rejected Error: tried to send while {status} {location}")]
    SendRejected {
        status: ConnectionStatus,
        location: ErrorLocation,
    },

    #[error("Manager Stopped Error: connection manager is no longer running {location}")]
    ManagerStopped { location: ErrorLocation },
}

impl ConnectionError {
    #[track_caller]
    pub fn transport_unavailable(address: impl Into<String>, message: impl Into<String>) -> Self {
        ConnectionError::TransportUnavailable {
            address: address.into(),
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn transport_error(message: impl Into<String>) -> Self {
        ConnectionError::TransportError {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn transport_closed(connection_id: u64) -> Self {
        ConnectionError::TransportClosed {
            connection_id,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn send_rejected(status: ConnectionStatus) -> Self {
        ConnectionError::SendRejected {
            status,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn manager_stopped() -> Self {
        ConnectionError::ManagerStopped {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Fatal errors are reported once and never retried.
    pub fn is_fatal(&self) -> bool {
        match self {
            ConnectionError::TransportUnavailable { .. } => true,
            ConnectionError::ManagerStopped { .. } => true,
            ConnectionError::TransportError { .. } => false,
            ConnectionError::TransportClosed { .. } => false,
            ConnectionError::SendRejected { .. } => false,
        }
    }

    /// Short category name used in log lines.
    pub fn error_category(&self) -> &'static str {
        match self {
            ConnectionError::TransportUnavailable { .. } => "transport_unavailable",
            ConnectionError::TransportError { .. } => "transport_error",
            ConnectionError::TransportClosed { .. } => "transport_closed",
            ConnectionError::SendRejected { .. } => "send_rejected",
            ConnectionError::ManagerStopped { .. } => "manager_stopped",
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ConnectionError {
    #[track_caller]
    fn from(error: tokio_tungstenite::tungstenite::Error) -> Self {
        ConnectionError::TransportError {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
