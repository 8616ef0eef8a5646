//! UseCase: Broadcast Dispatcher
//!
//! 保存済みのチャットメッセージを、配送時点で登録されている全接続へ送ります。
//! すべてのブロードキャストは 1 本のキューと 1 つのタスクを通るため、
//! `publish` された順序のまま配送されます。
//! 送信に失敗した接続は再送せず Registry から解除します。

use std::sync::Arc;

use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    domain::ChatMessage,
    infrastructure::{ConnectionRegistry, dto::codec::encode_chat},
    usecase::SendMessageError,
};

/// Single ordered fan-out point for chat messages
#[derive(Clone)]
pub struct BroadcastDispatcher {
    queue: mpsc::UnboundedSender<ChatMessage>,
}

impl BroadcastDispatcher {
    /// Start the dispatcher task.
    ///
    /// The task ends once every `BroadcastDispatcher` clone is dropped.
    pub fn spawn(registry: Arc<ConnectionRegistry>) -> (Self, JoinHandle<()>) {
        let (queue, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(dispatch_loop(rx, registry));
        (Self { queue }, handle)
    }

    /// Enqueue a persisted message for delivery
    pub fn publish(&self, message: ChatMessage) -> Result<(), SendMessageError> {
        self.queue
            .send(message)
            .map_err(|_| SendMessageError::DispatcherStopped)
    }
}

async fn dispatch_loop(
    mut rx: mpsc::UnboundedReceiver<ChatMessage>,
    registry: Arc<ConnectionRegistry>,
) {
    tracing::info!("Broadcast dispatcher started");
    while let Some(message) = rx.recv().await {
        deliver(&registry, &message).await;
    }
    tracing::info!("Broadcast dispatcher stopped");
}

/// Deliver one message to every connection registered right now.
///
/// Returns the number of connections the message was handed to.
pub async fn deliver(registry: &ConnectionRegistry, message: &ChatMessage) -> usize {
    let frame = match encode_chat(message) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::error!("Could not encode message {}: {}", message.id.value(), e);
            return 0;
        }
    };

    let targets = registry.all_connections().await;
    tracing::info!("Sending msg to {} clients", targets.len());

    let mut delivered = 0;
    for target in targets {
        match target.send(frame.clone()) {
            Ok(()) => delivered += 1,
            Err(e) => {
                tracing::warn!("Could not send message to connection: {}", e);
                registry.unregister(&target.id()).await;
            }
        }
    }
    delivered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ConnectionId, MessageId, MessageText, Room, RoomId, User, UserId},
        infrastructure::{
            ConnectionHandle, PusherReceiver, pusher_channel,
            dto::websocket::{ChatMessageDto, Envelope, MessageType},
        },
    };
    use chat_relay_shared::time::{Clock, FixedClock};
    use std::time::Duration;

    fn message(id: i64, text: &str) -> ChatMessage {
        ChatMessage {
            id: MessageId::new(id),
            text: MessageText::new(text.to_string()).unwrap(),
            author: User::new(UserId::new(1), "alice", true),
            room: Room::new(RoomId::DEFAULT, "Global"),
            timestamp: FixedClock::from_millis(0).now(),
        }
    }

    async fn connect(
        registry: &ConnectionRegistry,
    ) -> (ConnectionHandle, PusherReceiver) {
        let (tx, rx) = pusher_channel();
        let handle = ConnectionHandle::new(ConnectionId::generate(), tx);
        registry.register(handle.clone(), None).await;
        (handle, rx)
    }

    fn decode(frame: &str) -> Envelope<ChatMessageDto> {
        serde_json::from_str(frame).unwrap()
    }

    #[tokio::test]
    async fn test_deliver_to_every_registered_connection_once() {
        // テスト項目: 登録済みの全接続にちょうど 1 回ずつ配送される
        // given (前提条件):
        let registry = ConnectionRegistry::new();
        let (_a, mut rx_a) = connect(&registry).await;
        let (_b, mut rx_b) = connect(&registry).await;

        // when (操作):
        let delivered = deliver(&registry, &message(1, "hello")).await;

        // then (期待する結果):
        assert_eq!(delivered, 2);
        for rx in [&mut rx_a, &mut rx_b] {
            let envelope = decode(&rx.recv().await.unwrap());
            assert_eq!(envelope.r#type, MessageType::Chat);
            assert_eq!(envelope.data.message, "hello");
            assert!(rx.try_recv().is_err());
        }
    }

    #[tokio::test]
    async fn test_deliver_unregisters_failed_connection() {
        // テスト項目: 送信に失敗した接続は Registry から解除され、再送されない
        // given (前提条件):
        let registry = ConnectionRegistry::new();
        let (_alive, mut rx_alive) = connect(&registry).await;
        let (dead, rx_dead) = connect(&registry).await;
        drop(rx_dead);

        // when (操作):
        let delivered = deliver(&registry, &message(1, "hello")).await;

        // then (期待する結果):
        assert_eq!(delivered, 1);
        assert_eq!(registry.count().await, 1);
        assert!(rx_alive.recv().await.is_some());
        assert!(!registry.unregister(&dead.id()).await);
    }

    #[tokio::test]
    async fn test_deliver_unregisters_stalled_connection() {
        // テスト項目: 読み取りが止まってバッファが埋まった接続は解除され、他の接続には届く
        // given (前提条件):
        let registry = ConnectionRegistry::new();
        let (_alive, mut rx_alive) = connect(&registry).await;
        let (tx, _rx_stalled) = mpsc::channel(1);
        let stalled = ConnectionHandle::new(ConnectionId::generate(), tx);
        registry.register(stalled.clone(), None).await;
        stalled.send("backlog".to_string()).unwrap();

        // when (操作):
        let delivered = deliver(&registry, &message(1, "hello")).await;

        // then (期待する結果):
        assert_eq!(delivered, 1);
        assert_eq!(registry.count().await, 1);
        assert!(rx_alive.recv().await.is_some());
        assert!(!registry.unregister(&stalled.id()).await);
    }

    #[tokio::test]
    async fn test_publish_preserves_order() {
        // テスト項目: publish した順序のまま全接続に配送される
        // given (前提条件):
        let registry = Arc::new(ConnectionRegistry::new());
        let (_a, mut rx_a) = connect(&registry).await;
        let (_b, mut rx_b) = connect(&registry).await;
        let (dispatcher, _task) = BroadcastDispatcher::spawn(registry.clone());

        // when (操作):
        for id in 1..=20 {
            dispatcher.publish(message(id, &format!("m{}", id))).unwrap();
        }

        // then (期待する結果):
        for rx in [&mut rx_a, &mut rx_b] {
            for id in 1..=20 {
                let frame = tokio::time::timeout(Duration::from_secs(1), rx.recv())
                    .await
                    .unwrap()
                    .unwrap();
                assert_eq!(decode(&frame).data.id, id);
            }
        }
    }

    #[tokio::test]
    async fn test_publish_with_no_connections() {
        // テスト項目: 接続がなくてもエラーにならない
        // given (前提条件):
        let registry = ConnectionRegistry::new();

        // when (操作):
        let delivered = deliver(&registry, &message(1, "hello")).await;

        // then (期待する結果):
        assert_eq!(delivered, 0);
    }
}
