use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of a LINE webhook delivery.
///
/// Events stay as raw JSON so the event log records them exactly as received;
/// `Event::from_value` gives the typed view.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackRequest {
    #[serde(default)]
    pub destination: String,
    pub events: Vec<Value>,
}

impl CallbackRequest {
    pub fn parse(body: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(body)
    }
}

/// A webhook event, one variant per event `type` this relay knows about.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Event {
    Message(MessageEvent),
    Follow(ReplyableEvent),
    Unfollow(BasicEvent),
    Join(ReplyableEvent),
    Leave(BasicEvent),
    MemberJoined(ReplyableEvent),
    MemberLeft(BasicEvent),
    Postback(PostbackEvent),
    Unsend(UnsendEvent),
    #[serde(other)]
    Unknown,
}

impl Event {
    pub fn from_value(value: &Value) -> serde_json::Result<Self> {
        Event::deserialize(value)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Event::Message(_) => "message",
            Event::Follow(_) => "follow",
            Event::Unfollow(_) => "unfollow",
            Event::Join(_) => "join",
            Event::Leave(_) => "leave",
            Event::MemberJoined(_) => "memberJoined",
            Event::MemberLeft(_) => "memberLeft",
            Event::Postback(_) => "postback",
            Event::Unsend(_) => "unsend",
            Event::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
pub struct MessageEvent {
    /// Absent when the channel is in standby mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    #[serde(default)]
    pub timestamp: i64,
    pub message: MessageContent,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
pub struct ReplyableEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[allow(dead_code)]
pub struct BasicEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
pub struct PostbackEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_token: Option<String>,
    pub postback: Postback,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[allow(dead_code)]
pub struct Postback {
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[allow(dead_code)]
pub struct UnsendEvent {
    pub unsend: Unsend,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[allow(dead_code)]
pub struct Unsend {
    #[serde(rename = "messageId")]
    pub message_id: String,
}

/// Where an event came from. Ids are optional so a partial source never
/// makes the surrounding event undecodable.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
#[allow(dead_code)]
pub enum Source {
    User {
        #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
        user_id: Option<String>,
    },
    Group {
        #[serde(rename = "groupId", default, skip_serializing_if = "Option::is_none")]
        group_id: Option<String>,
        #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
        user_id: Option<String>,
    },
    Room {
        #[serde(rename = "roomId", default, skip_serializing_if = "Option::is_none")]
        room_id: Option<String>,
        #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
        user_id: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
#[allow(dead_code)]
pub enum MessageContent {
    Text { id: String, text: String },
    Image { id: String },
    Video { id: String },
    Audio { id: String },
    File { id: String },
    Location { id: String },
    Sticker { id: String },
    #[serde(other)]
    Unknown,
}
