use serde::Deserialize;
use serde_json::Value;
use teloxide::types::{Message, Update, UpdateKind};
use tracing::debug;

/// Telegram "Group Anonymous Bot" id, used when an anonymous admin posts.
const ANONYMOUS_BOT_ID: u64 = 1087968824;

/// The fields of a Telegram text message the bot acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub chat_id: i64,
    /// Sender id as a string, compared textually against the operator id.
    pub user_id: String,
    /// Message text with surrounding whitespace removed.
    pub text: String,
    pub message_id: i32,
}

/// Extract an [`InboundMessage`] from a raw webhook `Update`.
///
/// Returns `None` for anything that is not a new text message from a user:
/// edited messages, photos, channel posts, other bots, blank text, or JSON
/// that is not an `Update` at all.
pub fn parse_update(update: &Value) -> Option<InboundMessage> {
    let update = match Update::deserialize(update) {
        Ok(update) => update,
        Err(e) => {
            debug!("not a telegram update: {e}");
            return None;
        }
    };

    match update.kind {
        UpdateKind::Message(message) => extract_message(&message),
        _ => None,
    }
}

fn extract_message(msg: &Message) -> Option<InboundMessage> {
    // Channel posts have no sender.
    let user = msg.from.as_ref()?;

    // Ignore bots to prevent loops, but allow anonymous admins.
    if user.is_bot && user.id.0 != ANONYMOUS_BOT_ID {
        return None;
    }

    let text = msg.text()?.trim();
    if text.is_empty() {
        return None;
    }

    Some(InboundMessage {
        chat_id: msg.chat.id.0,
        user_id: user.id.0.to_string(),
        text: text.to_string(),
        message_id: msg.id.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(json: &str) -> Value {
        serde_json::from_str(json).expect("failed to parse json")
    }

    #[test]
    fn parses_private_message() {
        let raw = update(
            r#"{
            "update_id": 10,
            "message": {
                "message_id": 1,
                "date": 1620000000,
                "chat": {"id": 12345, "type": "private", "first_name": "Alice"},
                "from": {"id": 111, "is_bot": false, "first_name": "Alice"},
                "text": "  hello  "
            }
        }"#,
        );

        let msg = parse_update(&raw).expect("should extract message");
        assert_eq!(msg.chat_id, 12345);
        assert_eq!(msg.user_id, "111");
        assert_eq!(msg.text, "hello");
        assert_eq!(msg.message_id, 1);
    }

    #[test]
    fn parses_group_message_with_negative_chat_id() {
        let raw = update(
            r#"{
            "update_id": 11,
            "message": {
                "message_id": 2,
                "date": 1620000000,
                "chat": {"id": -987654321, "type": "supergroup", "title": "My Group"},
                "from": {"id": 222, "is_bot": false, "first_name": "Bob"},
                "text": "/img a cat"
            }
        }"#,
        );

        let msg = parse_update(&raw).expect("should extract message");
        assert_eq!(msg.chat_id, -987654321);
        assert_eq!(msg.user_id, "222");
        assert_eq!(msg.text, "/img a cat");
    }

    #[test]
    fn ignores_photo_without_text() {
        let raw = update(
            r#"{
            "update_id": 12,
            "message": {
                "message_id": 3,
                "date": 1620000000,
                "chat": {"id": 1, "type": "private", "first_name": "A"},
                "from": {"id": 1, "is_bot": false, "first_name": "A"},
                "photo": [{
                    "file_id": "AgAD",
                    "file_unique_id": "AQAD",
                    "width": 90,
                    "height": 90,
                    "file_size": 1024
                }],
                "caption": "look"
            }
        }"#,
        );
        assert!(parse_update(&raw).is_none());
    }

    #[test]
    fn ignores_other_bots() {
        let raw = update(
            r#"{
            "update_id": 13,
            "message": {
                "message_id": 4,
                "date": 1620000000,
                "chat": {"id": -100, "type": "group", "title": "G"},
                "from": {"id": 999, "is_bot": true, "first_name": "SomeBot"},
                "text": "hello"
            }
        }"#,
        );
        assert!(parse_update(&raw).is_none());
    }

    #[test]
    fn accepts_anonymous_admin() {
        let raw = update(
            r#"{
            "update_id": 14,
            "message": {
                "message_id": 5,
                "date": 1620000000,
                "chat": {"id": -100, "type": "group", "title": "G"},
                "from": {"id": 1087968824, "is_bot": true, "first_name": "Group", "username": "GroupAnonymousBot"},
                "text": "hello"
            }
        }"#,
        );
        let msg = parse_update(&raw).expect("anonymous admin is a person");
        assert_eq!(msg.user_id, "1087968824");
    }

    #[test]
    fn ignores_blank_text() {
        let raw = update(
            r#"{
            "update_id": 15,
            "message": {
                "message_id": 6,
                "date": 1620000000,
                "chat": {"id": 1, "type": "private", "first_name": "A"},
                "from": {"id": 1, "is_bot": false, "first_name": "A"},
                "text": "  \n "
            }
        }"#,
        );
        assert!(parse_update(&raw).is_none());
    }

    #[test]
    fn ignores_non_message_updates() {
        let edited = update(
            r#"{
            "update_id": 16,
            "edited_message": {
                "message_id": 7,
                "date": 1620000000,
                "edit_date": 1620000100,
                "chat": {"id": 1, "type": "private", "first_name": "A"},
                "from": {"id": 1, "is_bot": false, "first_name": "A"},
                "text": "fixed typo"
            }
        }"#,
        );
        assert!(parse_update(&edited).is_none());
        assert!(parse_update(&Value::Null).is_none());
        assert!(parse_update(&serde_json::json!({"message": {"text": "hi"}})).is_none());
    }
}
