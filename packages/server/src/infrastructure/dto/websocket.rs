//! WebSocket message DTOs.
//!
//! Every frame in both directions is an [`Envelope`] `{"data": ..., "type": n}`
//! where `type` is `0` for chat messages and `1` for notification events.

use serde::{Deserialize, Serialize};

/// Wire tag of an envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum MessageType {
    Chat,
    Event,
}

impl From<MessageType> for u8 {
    fn from(message_type: MessageType) -> Self {
        match message_type {
            MessageType::Chat => 0,
            MessageType::Event => 1,
        }
    }
}

impl TryFrom<u8> for MessageType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MessageType::Chat),
            1 => Ok(MessageType::Event),
            other => Err(format!("unknown message type {}", other)),
        }
    }
}

/// Envelope wrapping every outbound frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
    pub r#type: MessageType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDto {
    pub username: String,
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomDto {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

/// Chat message payload (`type = 0`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessageDto {
    pub message: String,
    pub user: UserDto,
    /// RFC 3339
    pub time: String,
    pub room: RoomDto,
    pub id: i64,
}

/// Notification payload (`type = 1`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationDto {
    pub user_id: i64,
    pub typ: String,
    pub msg: String,
}

/// Chat message submitted by a client.
///
/// Clients send the chat payload shape (optionally wrapped in an envelope).
/// Only `message` and `room` are honored; author, time and id are always
/// assigned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IncomingChatMessage {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub room: Option<RoomDto>,
}
