//! In-memory notification source backed by an unbounded channel.

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

use crate::domain::{NotificationSource, SourceError};

pub struct InMemoryNotificationSource {
    receiver: Mutex<mpsc::UnboundedReceiver<String>>,
}

impl InMemoryNotificationSource {
    /// Create a source plus the sender used to push raw payloads into it.
    ///
    /// Once every sender is dropped and the queue is drained, `pop` returns
    /// [`SourceError::Closed`].
    pub fn channel() -> (Self, mpsc::UnboundedSender<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                receiver: Mutex::new(rx),
            },
            tx,
        )
    }
}

#[async_trait]
impl NotificationSource for InMemoryNotificationSource {
    async fn pop(&self) -> Result<String, SourceError> {
        self.receiver
            .lock()
            .await
            .recv()
            .await
            .ok_or(SourceError::Closed)
    }
}
