use common::ErrorLocation;

use remote_core::error::{ConfigError, ConnectionError};

use std::panic::Location;

use thiserror::Error;

/// Errors that end the headless controller or reject one line of input.
///
/// Core errors are flattened to their message so every variant carries the
/// location where the controller observed them.
#[derive(Debug, Error)]
pub enum RemotePadError {
    /// Error from this App (paths, logger, stdin)
    #[error("Remote Pad Error: {message} {location}")]
    RemotePad {
        message: String,
        location: ErrorLocation,
    },

    /// Error from remote-core operations (config, connection)
    #[error("Core Error: {message} {location}")]
    Core {
        message: String,
        location: ErrorLocation,
    },

    /// A line on stdin that is not a controller command
    #[error("Input Error: {message} {location}")]
    Input {
        message: String,
        location: ErrorLocation,
    },
}

impl RemotePadError {
    #[track_caller]
    pub fn remote_pad(message: impl Into<String>) -> Self {
        RemotePadError::RemotePad {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn input(message: impl Into<String>) -> Self {
        RemotePadError::Input {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<ConfigError> for RemotePadError {
    #[track_caller]
    fn from(error: ConfigError) -> Self {
        RemotePadError::Core {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<ConnectionError> for RemotePadError {
    #[track_caller]
    fn from(error: ConnectionError) -> Self {
        RemotePadError::Core {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
