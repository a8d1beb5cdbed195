//! Frame codec.
//!
//! Inbound frames are either a JSON text document or a length-prefixed binary
//! frame whose tail is an opaque payload. Outbound frames are always JSON text.

use crate::KEEPALIVE_PAYLOAD;
use crate::error::frame::FrameError;
use crate::protocol::Message;

use std::borrow::Cow;

use bytes::{BufMut, Bytes, BytesMut};
use log::trace;
use serde_json::Value;

/// Size of the big-endian text length that opens every binary frame.
pub const LENGTH_PREFIX_LEN: usize = 4;

/// One frame as delivered by the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum RawFrame {
    Text(String),
    Binary(Bytes),
}

/// Something the client can put on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Message(Message),
    /// A bare JSON string, sent without an enclosing object.
    Bare(String),
}

impl Outbound {
    pub fn keepalive() -> Self {
        Outbound::Bare(KEEPALIVE_PAYLOAD.to_string())
    }
}

impl From<Message> for Outbound {
    fn from(message: Message) -> Self {
        Outbound::Message(message)
    }
}

/// Decode one inbound frame.
///
/// # Errors
///
/// Returns [`FrameError::MalformedFrame`] if the frame is not a JSON object with an
/// integer `type`, or if a binary frame's length prefix is missing or overruns the frame.
pub fn decode(raw: RawFrame) -> Result<Message, FrameError> {
    match raw {
        RawFrame::Text(text) => decode_text(&text),
        RawFrame::Binary(frame) => decode_binary(frame),
    }
}

pub fn decode_text(text: &str) -> Result<Message, FrameError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| FrameError::malformed(format!("invalid JSON text: {e}")))?;

    match value {
        Value::Object(fields) => Message::from_fields(fields),
        other => Err(FrameError::malformed(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

/// Decode a length-prefixed frame. The payload after the text segment is a
/// `Bytes::slice` of `frame`, so it shares the frame's allocation.
pub fn decode_binary(frame: Bytes) -> Result<Message, FrameError> {
    if frame.len() < LENGTH_PREFIX_LEN {
        return Err(FrameError::malformed(format!(
            "binary frame of {} bytes is shorter than its length prefix",
            frame.len()
        )));
    }

    let mut prefix = [0u8; LENGTH_PREFIX_LEN];
    prefix.copy_from_slice(&frame[..LENGTH_PREFIX_LEN]);
    let text_length = u32::from_be_bytes(prefix) as usize;

    let available = frame.len() - LENGTH_PREFIX_LEN;
    if text_length > available {
        return Err(FrameError::malformed(format!(
            "text segment of {text_length} bytes overruns the {available} bytes after the prefix"
        )));
    }

    let text_end = LENGTH_PREFIX_LEN + text_length;
    let message = decode_text(&segment_text(&frame[LENGTH_PREFIX_LEN..text_end]))?;
    let payload = frame.slice(text_end..);

    trace!(
        "Decoded binary frame: {text_length} text bytes, {} payload bytes",
        payload.len()
    );

    Ok(message.with_data(payload))
}

/// Encode an outbound frame as JSON text.
///
/// # Errors
///
/// Returns [`FrameError::Encode`] if serialization fails.
pub fn encode(outbound: &Outbound) -> Result<String, FrameError> {
    let encoded = match outbound {
        Outbound::Message(message) => serde_json::to_string(message),
        Outbound::Bare(text) => serde_json::to_string(text),
    };

    encoded.map_err(|e| FrameError::encode(format!("Failed to serialize outbound frame: {e}")))
}

/// Build a length-prefixed binary frame around `message`.
///
/// The client never sends these; this is the server-side inverse of
/// [`decode_binary`]. Any payload already bound to `message` is ignored.
pub fn encode_binary(message: &Message, payload: &[u8]) -> Result<Bytes, FrameError> {
    let text = serde_json::to_string(message)
        .map_err(|e| FrameError::encode(format!("Failed to serialize message text: {e}")))?;

    let text_length = u32::try_from(text.len()).map_err(|_| {
        FrameError::encode(format!(
            "text segment of {} bytes does not fit a u32 prefix",
            text.len()
        ))
    })?;

    let mut buf = BytesMut::with_capacity(LENGTH_PREFIX_LEN + text.len() + payload.len());
    buf.put_u32(text_length);
    buf.put_slice(text.as_bytes());
    buf.put_slice(payload);
    Ok(buf.freeze())
}

/// Text segments are normally UTF-8. Anything else is read byte-per-char as Latin-1.
fn segment_text(segment: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(segment) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => Cow::Owned(segment.iter().copied().map(char::from).collect()),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
