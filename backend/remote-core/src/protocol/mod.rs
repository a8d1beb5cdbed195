//! Wire protocol between the remote pad and the rendering server.
//!
//! Messages are JSON objects carrying an integer `type`. The server may also send
//! binary frames laid out as:
//!
//! ```text
//! [u32 big-endian L][L bytes of JSON text][remaining bytes = raw payload]
//! ```
//!
//! The raw payload is attached to the decoded [`Message`] as its `data` without
//! copying. The client itself only ever sends JSON text frames.

pub mod frame;
mod keysym;
mod message;
mod message_type;

pub use frame::{Outbound, RawFrame, decode, encode, encode_binary};
pub use keysym::keysym;
pub use message::Message;
pub use message_type::MessageType;

pub const TYPE_FIELD: &str = "type";
pub const MIME_TYPE_FIELD: &str = "mimeType";
pub const VALUE_FIELD: &str = "value";
pub const KEY_FIELD: &str = "key";
pub const KEYSYM_FIELD: &str = "keysym";
pub const SYM_FIELD: &str = "sym";
