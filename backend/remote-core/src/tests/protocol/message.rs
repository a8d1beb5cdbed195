// Unit tests for Message construction and accessors

use crate::protocol::{Message, MessageType, keysym};

use bytes::Bytes;
use serde_json::{Map, Value, json};

/// **VALUE**: Verifies a key-down for 'W' produces the exact wire object the server expects.
///
/// **WHY THIS MATTERS**: The server maps `sym` straight to a camera action. Upper-case
/// keysyms (87) would be a different key on the server side.
///
/// **BUG THIS CATCHES**: Would catch the lower-casing being dropped or the nesting changed.
#[test]
fn given_upper_case_key_when_key_down_built_then_lower_case_keysym() {
    let message = Message::key_down('W');

    assert_eq!(
        message.to_json(),
        json!({"type": 2, "key": {"keysym": {"sym": 119}}})
    );
    assert_eq!(message.keysym(), Some(119));
}

#[test]
fn given_characters_when_keysym_then_lower_case_code_point() {
    assert_eq!(keysym('W'), 119);
    assert_eq!(keysym('w'), 119);
    assert_eq!(keysym('A'), 97);
    assert_eq!(keysym(' '), 32);
    assert_eq!(keysym('1'), 49);
}

#[test]
fn given_key_up_when_built_then_key_up_type() {
    let message = Message::key_up('s');

    assert_eq!(message.message_type(), Some(MessageType::KeyUp));
    assert_eq!(message.type_code(), 3);
    assert_eq!(message.keysym(), Some(115));
}

/// **VALUE**: Verifies the SEND_IMAGE request token is just `{type: 1000}`.
#[test]
fn given_send_image_when_built_then_type_only() {
    assert_eq!(Message::send_image().to_json(), json!({"type": 1000}));
}

/// **VALUE**: Verifies `type` read from a JSON object becomes the type code and is not kept
/// as a regular field.
///
/// **BUG THIS CATCHES**: Would catch `type` appearing twice when the message is re-encoded.
#[test]
fn given_fields_with_type_when_from_fields_then_type_extracted() {
    let Value::Object(fields) = json!({"type": 0, "value": "hi"}) else {
        unreachable!()
    };

    let message = Message::from_fields(fields).unwrap();

    assert_eq!(message.message_type(), Some(MessageType::Comment));
    assert_eq!(message.value(), Some("hi"));
    assert_eq!(message.get("type"), None);
}

#[test]
fn given_fields_without_type_when_from_fields_then_malformed() {
    let result = Message::from_fields(Map::new());

    assert!(result.is_err_and(|e| e.is_malformed()));
}

/// **VALUE**: Verifies `with_field("type", ..)` updates the code instead of adding a field.
#[test]
fn given_type_field_when_with_field_then_type_code_changed() {
    let message = Message::new(MessageType::Comment)
        .with_field("type", 999)
        .with_field("type", "ignored");

    assert_eq!(message.type_code(), 999);
    assert_eq!(message.message_type(), None);
    assert_eq!(message.to_json(), json!({"type": 999}));
}

#[test]
fn given_image_message_when_data_taken_then_payload_moves_out() {
    let mut message = Message::image("image/png", Bytes::from_static(b"png"));

    assert_eq!(message.mime_type(), Some("image/png"));
    assert_eq!(message.take_data(), Some(Bytes::from_static(b"png")));
    assert_eq!(message.data(), None);
}

#[test]
fn given_message_types_when_displayed_then_wire_names() {
    assert_eq!(MessageType::Comment.to_string(), "COMMENT");
    assert_eq!(MessageType::SendImage.to_string(), "SEND_IMAGE");
    assert_eq!(MessageType::from_code(1000), Some(MessageType::SendImage));
    assert_eq!(MessageType::from_code(4), None);
}
