//! Message router: what to do with each inbound message type.
//!
//! | type | action |
//! |---|---|
//! | IMAGE | decode off-thread, swap the displayed image on success, request the next image |
//! | COMMENT | log the server's text |
//! | anything else | log "unknown type" |
//!
//! The next image is requested as soon as one arrives, so the server prepares
//! frame N+1 while frame N is decoding. At most one request is in flight per
//! received image.

mod image;

pub use image::{
    DisplayedImage, DisplayedImageReceiver, EncodedImage, ImageDecoder, ImageDisplay,
    PassthroughDecoder,
};

use crate::config::ImageOrdering;
use crate::connection::{ConnectionHandle, MessageHandler};
use crate::error::router::RouterError;
use crate::protocol::{Message, MessageType};

use std::sync::Arc;

use log::{debug, error, info, trace, warn};

/// Action taken for one routed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Decode of image number `sequence` started and the next image was requested.
    ImageDecodeStarted { sequence: u64 },
    Comment,
    Unknown { type_code: i64 },
}

pub struct MessageRouter<D: ImageDecoder> {
    connection: ConnectionHandle,
    decoder: Arc<D>,
    display: ImageDisplay<D::Image>,
    received_images: u64,
}

impl<D: ImageDecoder> MessageRouter<D> {
    pub fn new(connection: ConnectionHandle, decoder: D, ordering: ImageOrdering) -> Self {
        Self {
            connection,
            decoder: Arc::new(decoder),
            display: ImageDisplay::new(ordering),
            received_images: 0,
        }
    }

    /// Receiver woken whenever a new image becomes the displayed one.
    pub fn subscribe_images(&self) -> DisplayedImageReceiver<D::Image> {
        self.display.subscribe()
    }

    pub fn display(&self) -> &ImageDisplay<D::Image> {
        &self.display
    }

    pub fn route(&mut self, message: Message) -> Dispatch {
        match message.message_type() {
            Some(MessageType::Image) => self.on_image(message),
            Some(MessageType::Comment) => {
                info!("Server says: {}", message.value().unwrap_or_default());
                Dispatch::Comment
            }
            _ => {
                let type_code = message.type_code();
                warn!(
                    "Received message of unknown type: {} {}",
                    RouterError::unknown_message_type(type_code),
                    message.to_json()
                );
                Dispatch::Unknown { type_code }
            }
        }
    }

    fn on_image(&mut self, mut message: Message) -> Dispatch {
        self.received_images += 1;
        let sequence = self.received_images;

        let mime_type = message.mime_type().unwrap_or_default().to_string();
        let data = message.take_data().unwrap_or_default();
        let decoder = Arc::clone(&self.decoder);
        let display = self.display.clone();

        debug!(
            "Decoding image #{sequence} ({mime_type}, {} bytes)",
            data.len()
        );

        tokio::spawn(async move {
            let decoded =
                tokio::task::spawn_blocking(move || decoder.decode(&mime_type, data)).await;

            match decoded {
                Ok(Ok(image)) => {
                    if display.publish(sequence, image) {
                        debug!("Displaying image #{sequence}");
                    } else {
                        debug!("Image #{sequence} finished after a newer image, discarded");
                    }
                }
                Ok(Err(e)) => warn!("Error loading image #{sequence}: {e}"),
                Err(e) => error!("Decode task for image #{sequence} failed: {e}"),
            }
        });

        if let Err(e) = self.connection.request_image() {
            warn!("Could not request the next image: {e}");
        }

        Dispatch::ImageDecodeStarted { sequence }
    }
}

impl<D: ImageDecoder> MessageHandler for MessageRouter<D> {
    fn on_message(&mut self, message: Message) {
        let dispatch = self.route(message);
        trace!("Routed message: {dispatch:?}");
    }
}
