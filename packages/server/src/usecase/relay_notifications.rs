//! UseCase: 通知の中継
//!
//! 外部のキューから通知イベントを 1 件ずつ取り出し、レートリミッターで判定したうえで
//! 受信者の接続に直接送信します。
//!
//! - デコードできないペイロードはログに残して破棄し、ループを続ける
//! - 受信者がオフライン、または上限超過の場合も破棄する（再送しない）

use std::{sync::Arc, time::Duration};

use tokio::task::JoinHandle;

use crate::{
    domain::{Event, NotificationSource, SourceError},
    infrastructure::{ConnectionRegistry, dto::codec},
    usecase::RateLimiter,
};

/// Wait before reading again after the source reported a failure
const SOURCE_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Outcome of handling one raw notification payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// The payload was not a valid event
    Malformed,
    /// The recipient already got the maximum number of events in this window
    RateLimited,
    /// The recipient has no registered connection
    Offline,
    /// The recipient's connection failed while sending
    Failed,
}

pub struct NotificationRelay {
    source: Arc<dyn NotificationSource>,
    limiter: Arc<RateLimiter>,
    registry: Arc<ConnectionRegistry>,
}

impl NotificationRelay {
    pub fn new(
        source: Arc<dyn NotificationSource>,
        limiter: Arc<RateLimiter>,
        registry: Arc<ConnectionRegistry>,
    ) -> Self {
        Self {
            source,
            limiter,
            registry,
        }
    }

    /// Spawn the long-lived relay task
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Pop and deliver events until the source closes
    pub async fn run(self) {
        tracing::info!("Listening for notification events");
        loop {
            match self.source.pop().await {
                Ok(raw) => {
                    self.handle_payload(&raw).await;
                }
                Err(SourceError::Closed) => {
                    tracing::info!("Notification source closed, stopping relay");
                    return;
                }
                Err(e) => {
                    tracing::error!("Could not read from notification source: {}", e);
                    tokio::time::sleep(SOURCE_RETRY_DELAY).await;
                }
            }
        }
    }

    /// Decode, rate limit and deliver one raw payload
    pub async fn handle_payload(&self, raw: &str) -> Delivery {
        let event = match codec::decode_event(raw) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!("{}", e);
                return Delivery::Malformed;
            }
        };

        if !self.limiter.allow(event.recipient).await {
            tracing::info!(
                "User with id {} already got the maximum of events. Not sending event!",
                event.recipient
            );
            return Delivery::RateLimited;
        }

        self.deliver(&event).await
    }

    async fn deliver(&self, event: &Event) -> Delivery {
        let Some(connection) = self.registry.lookup_connection_for_user(event.recipient).await
        else {
            tracing::info!("User with id {} not connected", event.recipient);
            return Delivery::Offline;
        };

        let frame = match codec::encode_event(event) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!("Could not encode event for user {}: {}", event.recipient, e);
                return Delivery::Failed;
            }
        };

        match connection.send(frame) {
            Ok(()) => {
                tracing::info!(
                    "Got Event: User-id: {}, Typ: {}. Sent event to user",
                    event.recipient,
                    event.kind
                );
                Delivery::Delivered
            }
            Err(e) => {
                tracing::warn!("Could not send event: {}", e);
                self.registry.unregister(&connection.id()).await;
                Delivery::Failed
            }
        }
    }
}
