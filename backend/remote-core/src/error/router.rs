use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum RouterError {
    /// Inbound message whose `type` has no route. Logged and ignored.
    #[error("Unknown Message Type Error: type {type_code} {location}")]
    UnknownMessageType {
        type_code: i64,
        location: ErrorLocation,
    },
}

impl RouterError {
    #[track_caller]
    pub fn unknown_message_type(type_code: i64) -> Self {
        RouterError::UnknownMessageType {
            type_code,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
