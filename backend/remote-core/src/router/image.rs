use crate::config::ImageOrdering;
use crate::error::image::ImageDecodeError;

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::watch;

const IMAGE_MIME_PREFIX: &str = "image/";

/// Turns an IMAGE payload into something the presentation layer can draw.
///
/// Runs on a blocking thread, so it may be slow; it must not touch the socket.
pub trait ImageDecoder: Send + Sync + 'static {
    type Image: Send + Sync + 'static;

    fn decode(&self, mime_type: &str, data: Bytes) -> Result<Self::Image, ImageDecodeError>;
}

/// Image bytes exactly as received, tagged with their MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub mime_type: String,
    pub data: Bytes,
}

/// Checks that a payload looks like an image and hands the bytes through.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughDecoder;

impl ImageDecoder for PassthroughDecoder {
    type Image = EncodedImage;

    fn decode(&self, mime_type: &str, data: Bytes) -> Result<EncodedImage, ImageDecodeError> {
        if !mime_type.starts_with(IMAGE_MIME_PREFIX) {
            return Err(ImageDecodeError::unsupported_mime_type(mime_type));
        }

        if data.is_empty() {
            return Err(ImageDecodeError::empty_payload(mime_type));
        }

        Ok(EncodedImage {
            mime_type: mime_type.to_string(),
            data,
        })
    }
}

/// A decoded image and the receipt order of the message it came from.
#[derive(Debug)]
pub struct DisplayedImage<I> {
    pub sequence: u64,
    pub image: I,
}

pub type DisplayedImageReceiver<I> = watch::Receiver<Option<Arc<DisplayedImage<I>>>>;

/// The "currently displayed image" slot.
///
/// Publishing swaps the whole `Arc` at once, and subscribers are woken on every
/// swap. With [`ImageOrdering::LastReceivedWins`] an image older than the one
/// shown is rejected.
pub struct ImageDisplay<I> {
    ordering: ImageOrdering,
    slot: Arc<watch::Sender<Option<Arc<DisplayedImage<I>>>>>,
}

impl<I> ImageDisplay<I> {
    pub fn new(ordering: ImageOrdering) -> Self {
        let (slot, _) = watch::channel(None);
        Self {
            ordering,
            slot: Arc::new(slot),
        }
    }

    pub fn ordering(&self) -> ImageOrdering {
        self.ordering
    }

    pub fn subscribe(&self) -> DisplayedImageReceiver<I> {
        self.slot.subscribe()
    }

    pub fn current(&self) -> Option<Arc<DisplayedImage<I>>> {
        self.slot.borrow().clone()
    }

    /// Offer a freshly decoded image. Returns true if it is now displayed.
    pub fn publish(&self, sequence: u64, image: I) -> bool {
        let ordering = self.ordering;
        self.slot.send_if_modified(move |current| {
            let stale = ordering == ImageOrdering::LastReceivedWins
                && current
                    .as_ref()
                    .is_some_and(|shown| shown.sequence > sequence);
            if stale {
                return false;
            }

            *current = Some(Arc::new(DisplayedImage { sequence, image }));
            true
        })
    }
}

impl<I> Clone for ImageDisplay<I> {
    fn clone(&self) -> Self {
        Self {
            ordering: self.ordering,
            slot: Arc::clone(&self.slot),
        }
    }
}
