use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Envelope every Bot API method answers with.
#[derive(Clone, Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i32>,
    pub parameters: Option<ResponseParameters>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ResponseParameters {
    pub retry_after: Option<u64>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    /// Every other update kind (`edited_message`, `callback_query`, ...).
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Update {
    pub fn kind(&self) -> &str {
        if self.message.is_some() {
            return "message";
        }
        self.other.keys().next().map(String::as_str).unwrap_or("unknown")
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub date: i64,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    pub username: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMemberStatus {
    Creator,
    Administrator,
    Member,
    Restricted,
    Left,
    Kicked,
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ChatMember {
    pub status: ChatMemberStatus,
}

impl ChatMember {
    /// Anyone who has not left and was not banned counts as a subscriber.
    pub fn is_subscribed(&self) -> bool {
        !matches!(self.status, ChatMemberStatus::Left | ChatMemberStatus::Kicked)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct GetUpdatesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    pub timeout: u64,
    pub allowed_updates: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct GetChatMemberRequest {
    pub chat_id: String,
    pub user_id: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SendMessageRequest {
    pub chat_id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ReplyMarkup {
    Keyboard(ReplyKeyboardMarkup),
    Remove(ReplyKeyboardRemove),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReplyKeyboardMarkup {
    pub keyboard: Vec<Vec<KeyboardButton>>,
    pub one_time_keyboard: bool,
    pub resize_keyboard: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct KeyboardButton {
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReplyKeyboardRemove {
    pub remove_keyboard: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BotIdentity {
    pub id: i64,
    pub username: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ApiResponse, ChatMember, ChatMemberStatus, Update};

    #[test]
    fn update_with_text_message_deserializes() {
        let raw = json!({
            "update_id": 9001,
            "message": {
                "message_id": 5,
                "date": 1_730_000_000,
                "chat": { "id": 42, "type": "private" },
                "from": { "id": 7, "is_bot": false, "first_name": "Аня" },
                "text": "/start"
            }
        });

        let update: Update = serde_json::from_value(raw).expect("update");
        assert_eq!(update.kind(), "message");
        let message = update.message.expect("message");
        assert_eq!(message.chat.id, 42);
        assert_eq!(message.from.map(|user| user.id), Some(7));
        assert_eq!(message.text.as_deref(), Some("/start"));
    }

    #[test]
    fn other_update_kinds_are_named() {
        let raw = json!({ "update_id": 1, "callback_query": { "id": "q" } });
        let update: Update = serde_json::from_value(raw).expect("update");
        assert!(update.message.is_none());
        assert_eq!(update.kind(), "callback_query");
    }

    #[test]
    fn member_status_maps_left_and_kicked_to_not_subscribed() {
        let cases = [
            ("creator", true),
            ("administrator", true),
            ("member", true),
            ("restricted", true),
            ("left", false),
            ("kicked", false),
        ];
        for (status, expected) in cases {
            let member: ChatMember =
                serde_json::from_value(json!({ "status": status })).expect("member");
            assert_eq!(member.is_subscribed(), expected, "status {status}");
        }

        let member: ChatMember =
            serde_json::from_value(json!({ "status": "something_new" })).expect("member");
        assert_eq!(member.status, ChatMemberStatus::Unknown);
    }

    #[test]
    fn error_envelope_keeps_description_and_retry_hint() {
        let raw = json!({
            "ok": false,
            "error_code": 429,
            "description": "Too Many Requests: retry after 3",
            "parameters": { "retry_after": 3 }
        });
        let response: ApiResponse<bool> = serde_json::from_value(raw).expect("response");
        assert!(!response.ok);
        assert_eq!(response.error_code, Some(429));
        assert_eq!(response.parameters.and_then(|params| params.retry_after), Some(3));
    }
}
