use std::fmt::{Display, Formatter, Result as FormatResult};

/// Known values of a message's `type` field.
///
/// `KeyDown` and `KeyUp` share their numbering with the server's input event
/// types, so the codes must not be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    Comment,
    Image,
    KeyDown,
    KeyUp,
    /// Request token asking the server to prepare the next image.
    SendImage,
}

impl MessageType {
    pub const fn code(self) -> i64 {
        match self {
            MessageType::Comment => 0,
            MessageType::Image => 1,
            MessageType::KeyDown => 2,
            MessageType::KeyUp => 3,
            MessageType::SendImage => 1000,
        }
    }

    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(MessageType::Comment),
            1 => Some(MessageType::Image),
            2 => Some(MessageType::KeyDown),
            3 => Some(MessageType::KeyUp),
            1000 => Some(MessageType::SendImage),
            _ => None,
        }
    }
}

impl Display for MessageType {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        let name = match self {
            MessageType::Comment => "COMMENT",
            MessageType::Image => "IMAGE",
            MessageType::KeyDown => "KEY_DOWN",
            MessageType::KeyUp => "KEY_UP",
            MessageType::SendImage => "SEND_IMAGE",
        };
        formatter.write_str(name)
    }
}
