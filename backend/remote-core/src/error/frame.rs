use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error as ThisError;

/// Errors raised by the frame codec.
#[derive(Debug, ThisError)]
pub enum FrameError {
    /// Inbound frame violates the text or length-prefixed binary layout.
    #[error("Malformed Frame Error: {message} {location}")]
    MalformedFrame {
        message: String,
        location: ErrorLocation,
    },

    #[error("Frame Encode Error: {message} {location}")]
    Encode {
        message: String,
        location: ErrorLocation,
    },
}

impl FrameError {
    #[track_caller]
    pub fn malformed(message: impl Into<String>) -> Self {
        FrameError::MalformedFrame {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn encode(message: impl Into<String>) -> Self {
        FrameError::Encode {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, FrameError::MalformedFrame { .. })
    }
}
