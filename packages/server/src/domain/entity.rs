//! Domain entities

use chrono::{DateTime, Utc};

use super::value_object::{MessageId, MessageText, RoomId, UserId};

/// A user account resolved from an authentication token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// Inactive users may not perform any actions
    pub active: bool,
}

impl User {
    pub fn new(id: UserId, username: impl Into<String>, active: bool) -> Self {
        Self {
            id,
            username: username.into(),
            active,
        }
    }
}

/// A chat room. Treated as immutable reference data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
}

impl Room {
    pub fn new(id: RoomId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A message that has not been persisted yet.
///
/// `author` is optional so that the store can reject anonymous messages
/// explicitly instead of comparing against a zero-valued user.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub text: MessageText,
    pub author: Option<User>,
    /// `None` means the default room
    pub room: Option<RoomId>,
    /// Server-assigned; clients never supply it
    pub timestamp: DateTime<Utc>,
}

impl NewMessage {
    /// Room the message is stored in
    pub fn room_id(&self) -> RoomId {
        self.room.unwrap_or(RoomId::DEFAULT)
    }
}

/// A durably persisted chat message. Only persisted messages are broadcast.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: MessageId,
    pub text: MessageText,
    pub author: User,
    pub room: Room,
    pub timestamp: DateTime<Utc>,
}

/// An out-of-band notification addressed to a single user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub recipient: UserId,
    /// Tag string, e.g. "info" or "order"
    pub kind: String,
    /// Opaque payload
    pub payload: String,
}
