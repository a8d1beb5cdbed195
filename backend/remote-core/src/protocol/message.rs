use crate::error::frame::FrameError;
use crate::protocol::{
    KEY_FIELD, KEYSYM_FIELD, MIME_TYPE_FIELD, MessageType, SYM_FIELD, TYPE_FIELD, VALUE_FIELD,
    keysym,
};

use bytes::Bytes;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value, json};

/// A protocol message: an integer `type` plus arbitrary JSON fields.
///
/// Binary frames additionally bind a raw payload, exposed through [`Message::data`].
/// The payload is never part of the JSON text, so serializing a message drops it.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    type_code: i64,
    fields: Map<String, Value>,
    data: Option<Bytes>,
}

impl Message {
    pub fn new(message_type: MessageType) -> Self {
        Self {
            type_code: message_type.code(),
            fields: Map::new(),
            data: None,
        }
    }

    /// Build a message from a decoded JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::MalformedFrame`] if `type` is missing or not an integer.
    #[track_caller]
    pub fn from_fields(mut fields: Map<String, Value>) -> Result<Self, FrameError> {
        let type_code = match fields.remove(TYPE_FIELD) {
            Some(value) => integral(&value).ok_or_else(|| {
                FrameError::malformed(format!("'{TYPE_FIELD}' must be an integer, got {value}"))
            })?,
            None => return Err(FrameError::malformed(format!("missing '{TYPE_FIELD}' field"))),
        };

        Ok(Self {
            type_code,
            fields,
            data: None,
        })
    }

    pub fn key_down(key: char) -> Self {
        Self::key_event(MessageType::KeyDown, keysym(key))
    }

    pub fn key_up(key: char) -> Self {
        Self::key_event(MessageType::KeyUp, keysym(key))
    }

    /// `{type, key: {keysym: {sym}}}` for an already translated keysym.
    pub fn key_event(message_type: MessageType, sym: u32) -> Self {
        Self::new(message_type).with_field(KEY_FIELD, json!({ KEYSYM_FIELD: { SYM_FIELD: sym } }))
    }

    pub fn send_image() -> Self {
        Self::new(MessageType::SendImage)
    }

    pub fn comment(value: impl Into<String>) -> Self {
        Self::new(MessageType::Comment).with_field(VALUE_FIELD, value.into())
    }

    pub fn image(mime_type: impl Into<String>, data: Bytes) -> Self {
        Self::new(MessageType::Image)
            .with_field(MIME_TYPE_FIELD, mime_type.into())
            .with_data(data)
    }

    /// Set a JSON field. Setting `type` to an integer changes the message type;
    /// any other `type` value is ignored.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        let value = value.into();

        if key == TYPE_FIELD {
            if let Some(code) = integral(&value) {
                self.type_code = code;
            }
            return self;
        }

        self.fields.insert(key, value);
        self
    }

    pub fn with_data(mut self, data: Bytes) -> Self {
        self.data = Some(data);
        self
    }

    pub fn type_code(&self) -> i64 {
        self.type_code
    }

    /// `None` for type codes outside the known enumeration.
    pub fn message_type(&self) -> Option<MessageType> {
        MessageType::from_code(self.type_code)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.get(MIME_TYPE_FIELD).and_then(Value::as_str)
    }

    /// Text of a COMMENT message.
    pub fn value(&self) -> Option<&str> {
        self.get(VALUE_FIELD).and_then(Value::as_str)
    }

    /// `key.keysym.sym` of a key event.
    pub fn keysym(&self) -> Option<i64> {
        self.get(KEY_FIELD)?
            .get(KEYSYM_FIELD)?
            .get(SYM_FIELD)?
            .as_i64()
    }

    pub fn data(&self) -> Option<&Bytes> {
        self.data.as_ref()
    }

    pub fn take_data(&mut self) -> Option<Bytes> {
        self.data.take()
    }

    /// JSON form of the message, `type` included, `data` excluded.
    pub fn to_json(&self) -> Value {
        let mut object = self.fields.clone();
        object.insert(TYPE_FIELD.to_string(), Value::from(self.type_code));
        Value::Object(object)
    }
}

/// Integer value of a JSON number, accepting floats with no fractional part.
fn integral(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

impl Serialize for Message {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry(TYPE_FIELD, &self.type_code)?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
