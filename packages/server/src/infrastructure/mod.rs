//! Infrastructure layer: wire format, connection registry and collaborator adapters.

pub mod connection_registry;
pub mod dto;
pub mod notification_source;
pub mod repository;

pub use connection_registry::{
    ConnectionHandle, ConnectionRegistry, OUTBOUND_BUFFER, PusherChannel, PusherReceiver,
    pusher_channel,
};
