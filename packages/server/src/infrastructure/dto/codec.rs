//! Encoding and decoding of WebSocket frames and notification payloads.

use serde::Deserialize;

use crate::domain::{ChatMessage, DecodeError, Event, ProtocolError, RoomId};

use super::websocket::{
    ChatMessageDto, Envelope, IncomingChatMessage, MessageType, NotificationDto,
};

/// A decoded client submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub text: String,
    /// `None` when the client omitted the room (or sent a zero id)
    pub room: Option<RoomId>,
}

/// Encode a persisted chat message as a `type = 0` envelope
pub fn encode_chat(message: &ChatMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(&Envelope {
        data: ChatMessageDto::from(message),
        r#type: MessageType::Chat,
    })
}

/// Encode a notification as a `type = 1` envelope
pub fn encode_event(event: &Event) -> Result<String, serde_json::Error> {
    serde_json::to_string(&Envelope {
        data: NotificationDto::from(event),
        r#type: MessageType::Event,
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IncomingFrame {
    Wrapped(Envelope<IncomingChatMessage>),
    Bare(IncomingChatMessage),
}

/// Decode a chat submission sent by a client
pub fn decode_submission(text: &str) -> Result<Submission, ProtocolError> {
    let incoming = match serde_json::from_str::<IncomingFrame>(text) {
        Ok(IncomingFrame::Wrapped(envelope)) => envelope.data,
        Ok(IncomingFrame::Bare(message)) => message,
        // Re-parse as the bare shape to surface a meaningful serde error
        Err(_) => serde_json::from_str::<IncomingChatMessage>(text)?,
    };

    Ok(Submission {
        text: incoming.message,
        room: incoming
            .room
            .filter(|room| room.id > 0)
            .map(|room| RoomId::new(room.id)),
    })
}

/// Decode a notification popped from the notification source
pub fn decode_event(raw: &str) -> Result<Event, DecodeError> {
    let dto: NotificationDto = serde_json::from_str(raw)?;
    Ok(dto.into())
}
