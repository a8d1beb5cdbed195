use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error as ThisError;

/// Errors reported by an [`ImageDecoder`](crate::router::ImageDecoder).
///
/// A failed decode never replaces the displayed image.
#[derive(Debug, ThisError)]
pub enum ImageDecodeError {
    #[error("Empty Image Error: no payload bound to '{mime_type}' image {location}")]
    EmptyPayload {
        mime_type: String,
        location: ErrorLocation,
    },

    #[error("Unsupported Image Error: mime type '{mime_type}' {location}")]
    UnsupportedMimeType {
        mime_type: String,
        location: ErrorLocation,
    },

    #[error("Image Decode Error: {message} {location}")]
    Decode {
        message: String,
        location: ErrorLocation,
    },
}

impl ImageDecodeError {
    #[track_caller]
    pub fn empty_payload(mime_type: impl Into<String>) -> Self {
        ImageDecodeError::EmptyPayload {
            mime_type: mime_type.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn unsupported_mime_type(mime_type: impl Into<String>) -> Self {
        ImageDecodeError::UnsupportedMimeType {
            mime_type: mime_type.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn decode(message: impl Into<String>) -> Self {
        ImageDecodeError::Decode {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
