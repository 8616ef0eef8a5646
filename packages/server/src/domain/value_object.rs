//! Value objects
//!
//! 識別子やメッセージ本文など、生成時に不変条件を検証する値オブジェクト。

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValidationError;

/// Maximum number of characters a chat message may contain.
pub const MAX_MESSAGE_CHARS: usize = 100;

/// Identifier of a user account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a chat room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(i64);

impl RoomId {
    /// The global chat room every message lands in unless told otherwise.
    pub const DEFAULT: RoomId = RoomId(1);

    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier assigned to a message by the persistence store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(i64);

impl MessageId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// Opaque identity of one live WebSocket connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Generate a fresh connection id
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Chat message body, at most [`MAX_MESSAGE_CHARS`] characters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageText(String);

impl MessageText {
    pub fn new(value: String) -> Result<Self, ValidationError> {
        let length = value.chars().count();
        if length > MAX_MESSAGE_CHARS {
            return Err(ValidationError::TextTooLong { length });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Number of history messages replayed to a newly connected client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryAmount(usize);

impl HistoryAmount {
    pub const DEFAULT: usize = 10;
    pub const MAX: usize = 100;

    /// Parse the `amount` query parameter.
    ///
    /// Missing, non-numeric and non-positive values fall back to
    /// [`HistoryAmount::DEFAULT`]; large values are clamped to [`HistoryAmount::MAX`].
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
            return Self(Self::DEFAULT);
        };

        match raw.parse::<i64>() {
            Ok(amount) if amount > 0 => Self((amount as u64).min(Self::MAX as u64) as usize),
            Ok(amount) => {
                tracing::warn!("Non-positive history amount {}, using default", amount);
                Self(Self::DEFAULT)
            }
            Err(e) => {
                tracing::warn!("Could not parse history amount '{}': {}", raw, e);
                Self(Self::DEFAULT)
            }
        }
    }

    pub fn value(&self) -> usize {
        self.0
    }
}

impl Default for HistoryAmount {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}
