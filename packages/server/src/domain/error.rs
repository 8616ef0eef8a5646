//! Error taxonomy of the relay.

use thiserror::Error;

use super::value_object::ConnectionId;

/// Authentication failures
#[derive(Debug, Error)]
pub enum AuthError {
    /// No token record exists (an empty token is treated the same way)
    #[error("No user with the token exists")]
    NotFound,

    /// The token resolves to a user that is marked inactive
    #[error("User is not active")]
    Inactive,

    /// The persistence store could not be queried
    #[error("Could not resolve token: {0}")]
    Unavailable(#[from] RepositoryError),
}

/// A submitted message violates a content rule
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Text was {length} characters long, at most 100 are allowed")]
    TextTooLong { length: usize },

    #[error("Message author cannot be empty")]
    EmptyAuthor,
}

/// Failures reported by the persistence collaborator
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Persistence store unavailable: {0}")]
    Unavailable(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Message rejected: {0}")]
    Validation(#[from] ValidationError),
}

/// An inbound WebSocket frame could not be understood
#[derive(Debug, Error)]
#[error("Malformed chat payload: {0}")]
pub struct ProtocolError(#[from] pub serde_json::Error);

/// A write to a connection failed because its stream is gone
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Connection '{0}' is closed")]
    Closed(ConnectionId),

    /// The connection's outbound buffer is full; the client stopped reading
    #[error("Connection '{0}' is not keeping up")]
    Full(ConnectionId),
}

/// A notification payload could not be decoded
#[derive(Debug, Error)]
#[error("Could not decode notification: {0}")]
pub struct DecodeError(#[from] pub serde_json::Error);

/// Reading from the notification source failed
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source will never produce another item
    #[error("Notification source closed")]
    Closed,

    #[error("Notification source unavailable: {0}")]
    Unavailable(String),
}

/// Fatal errors at process start
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Unable to connect to database: {0}")]
    Database(String),

    #[error("Failed to connect with notification source: {0}")]
    NotificationSource(String),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The listener failed after startup
    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}
