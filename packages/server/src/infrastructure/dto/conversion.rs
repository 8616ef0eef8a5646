//! Conversion logic between DTOs and domain entities.

use chat_relay_shared::time::to_rfc3339;

use crate::domain::{ChatMessage, Event, Room, User, UserId};
use crate::infrastructure::dto::websocket as dto;

// ========================================
// DTO → Domain Entity
// ========================================

impl From<dto::NotificationDto> for Event {
    fn from(dto: dto::NotificationDto) -> Self {
        Self {
            recipient: UserId::new(dto.user_id),
            kind: dto.typ,
            payload: dto.msg,
        }
    }
}

// ========================================
// Domain Entity → DTO
// ========================================

impl From<&User> for dto::UserDto {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            id: user.id.value(),
        }
    }
}

impl From<&Room> for dto::RoomDto {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id.value(),
            name: room.name.clone(),
        }
    }
}

impl From<&ChatMessage> for dto::ChatMessageDto {
    fn from(model: &ChatMessage) -> Self {
        Self {
            message: model.text.as_str().to_string(),
            user: (&model.author).into(),
            time: to_rfc3339(&model.timestamp),
            room: (&model.room).into(),
            id: model.id.value(),
        }
    }
}

impl From<&Event> for dto::NotificationDto {
    fn from(model: &Event) -> Self {
        Self {
            user_id: model.recipient.value(),
            typ: model.kind.clone(),
            msg: model.payload.clone(),
        }
    }
}
