//! Domain layer: entities, value objects, errors and collaborator interfaces.
//!
//! The persistence store and the notification queue are external systems.
//! This layer only defines the narrow traits through which they are reached;
//! concrete implementations live in the infrastructure layer.

pub mod connection;
pub mod entity;
pub mod error;
pub mod notification_source;
pub mod repository;
pub mod value_object;

pub use connection::ConnectionPhase;
pub use entity::{ChatMessage, Event, NewMessage, Room, User};
pub use error::{
    AuthError, DecodeError, ProtocolError, RepositoryError, SourceError, StartupError,
    TransportError, ValidationError,
};
pub use notification_source::NotificationSource;
pub use repository::ChatRepository;
pub use value_object::{
    ConnectionId, HistoryAmount, MAX_MESSAGE_CHARS, MessageId, MessageText, RoomId, UserId,
};
