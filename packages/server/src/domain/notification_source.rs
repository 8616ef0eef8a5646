//! Notification source trait
//!
//! An external durable FIFO list that other services push notification
//! events onto. The relay pops one raw payload at a time.

use async_trait::async_trait;

use super::SourceError;

#[async_trait]
pub trait NotificationSource: Send + Sync {
    /// Block until the next raw event payload is available and remove it from the list.
    async fn pop(&self) -> Result<String, SourceError>;
}
