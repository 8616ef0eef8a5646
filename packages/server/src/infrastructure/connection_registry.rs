//! Connection Registry
//!
//! ## 責務
//!
//! - 接続中の WebSocket ごとの送信チャンネル（`PusherChannel`）を管理
//! - 接続 ↔ ユーザー ID の双方向インデックスを保持
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! Registry は生成された `PusherChannel`（容量 `OUTBOUND_BUFFER` の有界チャンネル）を受け取り、送信に使用します。
//! バッファが埋まった接続は読み取りが止まったものとみなし、送信失敗として扱います。
//! 実際のソケットへの書き込みは接続ごとの pusher タスクが行うため、
//! Registry のロックを保持したまま I/O 待ちになることはありません。
//!
//! 両方向のマップは 1 つの `Mutex` で守られており、登録・解除は常にアトミックです。
//! 1 つのユーザー ID が同時に複数の接続に紐づくことはありません。

use std::collections::HashMap;

use tokio::sync::{
    Mutex,
    mpsc::{self, error::TrySendError},
};

use crate::domain::{ConnectionId, TransportError, User, UserId};

/// Frames buffered per connection before it is treated as stalled
pub const OUTBOUND_BUFFER: usize = 256;

/// Outbound channel of one connection; the pusher task drains it into the socket.
pub type PusherChannel = mpsc::Sender<String>;
pub type PusherReceiver = mpsc::Receiver<String>;

/// Create the outbound channel for a new connection
pub fn pusher_channel() -> (PusherChannel, PusherReceiver) {
    mpsc::channel(OUTBOUND_BUFFER)
}

/// Cloneable handle used to write to one live connection
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    sender: PusherChannel,
}

impl ConnectionHandle {
    pub fn new(id: ConnectionId, sender: PusherChannel) -> Self {
        Self { id, sender }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue a text frame for this connection without waiting
    pub fn send(&self, content: String) -> Result<(), TransportError> {
        self.sender.try_send(content).map_err(|e| match e {
            TrySendError::Full(_) => TransportError::Full(self.id),
            TrySendError::Closed(_) => TransportError::Closed(self.id),
        })
    }
}

struct ConnectionEntry {
    sender: PusherChannel,
    user_id: Option<UserId>,
}

#[derive(Default)]
struct RegistryInner {
    connections: HashMap<ConnectionId, ConnectionEntry>,
    users: HashMap<UserId, ConnectionId>,
}

/// Concurrency-safe bidirectional index of live connections and their users
#[derive(Default)]
pub struct ConnectionRegistry {
    inner: Mutex<RegistryInner>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection, optionally bound to an authenticated user.
    ///
    /// If the user was bound to another connection, that binding is moved:
    /// the old connection stays registered but anonymous.
    pub async fn register(&self, handle: ConnectionHandle, user: Option<&User>) {
        let mut inner = self.inner.lock().await;
        let connection_id = handle.id;
        let user_id = user.map(|u| u.id);

        if let Some(user_id) = user_id
            && let Some(previous) = inner.users.insert(user_id, connection_id)
            && previous != connection_id
        {
            if let Some(entry) = inner.connections.get_mut(&previous) {
                entry.user_id = None;
            }
            tracing::info!(
                "User {} moved from connection '{}' to '{}'",
                user_id,
                previous,
                connection_id
            );
        }

        // Re-registering a connection under a different user drops its old binding.
        let replaced = inner.connections.insert(
            connection_id,
            ConnectionEntry {
                sender: handle.sender,
                user_id,
            },
        );
        if let Some(old_user) = replaced.and_then(|entry| entry.user_id)
            && Some(old_user) != user_id
            && inner.users.get(&old_user) == Some(&connection_id)
        {
            inner.users.remove(&old_user);
        }

        tracing::info!(
            "Connection '{}' registered (user: {}). Total connections: {}",
            connection_id,
            user_id.map_or_else(|| "anonymous".to_string(), |id| id.to_string()),
            inner.connections.len()
        );
    }

    /// Remove a connection and its user binding.
    ///
    /// Returns `false` if the connection was not registered (idempotent).
    pub async fn unregister(&self, connection_id: &ConnectionId) -> bool {
        let mut inner = self.inner.lock().await;

        let Some(entry) = inner.connections.remove(connection_id) else {
            return false;
        };

        if let Some(user_id) = entry.user_id
            && inner.users.get(&user_id) == Some(connection_id)
        {
            inner.users.remove(&user_id);
        }

        tracing::info!(
            "Connection '{}' unregistered. Total connections: {}",
            connection_id,
            inner.connections.len()
        );
        true
    }

    /// Connection currently bound to `user_id`, if any
    pub async fn lookup_connection_for_user(&self, user_id: UserId) -> Option<ConnectionHandle> {
        let inner = self.inner.lock().await;
        let connection_id = inner.users.get(&user_id)?;
        inner
            .connections
            .get(connection_id)
            .map(|entry| ConnectionHandle::new(*connection_id, entry.sender.clone()))
    }

    /// Snapshot of every registered connection
    pub async fn all_connections(&self) -> Vec<ConnectionHandle> {
        let inner = self.inner.lock().await;
        inner
            .connections
            .iter()
            .map(|(id, entry)| ConnectionHandle::new(*id, entry.sender.clone()))
            .collect()
    }

    /// 接続中のコネクション数を取得
    pub async fn count(&self) -> usize {
        self.inner.lock().await.connections.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - register / unregister / lookup / all_connections の 4 操作
    // - ユーザーの付け替え時に古い逆引きが残らないこと
    // - 並行アクセス時に登録が失われないこと
    //
    // 【なぜこのテストが必要か】
    // - Registry は全接続タスク・ブロードキャスト・通知パイプラインから共有される
    // - 双方向マップの整合性が崩れると通知が別の接続に届いてしまう
    // ========================================

    fn create_handle() -> (ConnectionHandle, PusherReceiver) {
        let (tx, rx) = pusher_channel();
        (ConnectionHandle::new(ConnectionId::generate(), tx), rx)
    }

    fn user(id: i64) -> User {
        User::new(UserId::new(id), format!("user{}", id), true)
    }

    #[tokio::test]
    async fn test_register_then_lookup() {
        // テスト項目: 登録したユーザーの接続を引ける
        // given (前提条件):
        let registry = ConnectionRegistry::new();
        let (handle, mut rx) = create_handle();
        let alice = user(7);

        // when (操作):
        registry.register(handle.clone(), Some(&alice)).await;
        let found = registry.lookup_connection_for_user(alice.id).await;

        // then (期待する結果):
        let found = found.expect("connection should be registered");
        assert_eq!(found.id(), handle.id());
        found.send("ping".to_string()).unwrap();
        assert_eq!(rx.recv().await, Some("ping".to_string()));
    }

    #[tokio::test]
    async fn test_unregister_removes_both_directions_and_is_idempotent() {
        // テスト項目: unregister 後は引けなくなり、2 回目の unregister は何もしない
        // given (前提条件):
        let registry = ConnectionRegistry::new();
        let (handle, _rx) = create_handle();
        let alice = user(7);
        registry.register(handle.clone(), Some(&alice)).await;

        // when (操作):
        let first = registry.unregister(&handle.id()).await;
        let second = registry.unregister(&handle.id()).await;

        // then (期待する結果):
        assert!(first);
        assert!(!second);
        assert!(registry.lookup_connection_for_user(alice.id).await.is_none());
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test]
    async fn test_anonymous_connections_are_in_snapshot() {
        // テスト項目: ユーザー未認証の接続もスナップショットに含まれる
        // given (前提条件):
        let registry = ConnectionRegistry::new();
        let (anonymous, _rx1) = create_handle();
        let (authenticated, _rx2) = create_handle();

        // when (操作):
        registry.register(anonymous.clone(), None).await;
        registry.register(authenticated.clone(), Some(&user(1))).await;
        let snapshot = registry.all_connections().await;

        // then (期待する結果):
        assert_eq!(snapshot.len(), 2);
        let ids: Vec<ConnectionId> = snapshot.iter().map(|h| h.id()).collect();
        assert!(ids.contains(&anonymous.id()));
        assert!(ids.contains(&authenticated.id()));
    }

    #[tokio::test]
    async fn test_rebinding_user_leaves_no_stale_mapping() {
        // テスト項目: 同じユーザーが新しい接続で登録されたとき、古い接続の解除で新しい紐付けが消えない
        // given (前提条件):
        let registry = ConnectionRegistry::new();
        let (old, _rx_old) = create_handle();
        let (new, _rx_new) = create_handle();
        let alice = user(7);
        registry.register(old.clone(), Some(&alice)).await;

        // when (操作):
        registry.register(new.clone(), Some(&alice)).await;
        registry.unregister(&old.id()).await;

        // then (期待する結果):
        let found = registry.lookup_connection_for_user(alice.id).await;
        assert_eq!(found.map(|h| h.id()), Some(new.id()));
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test]
    async fn test_rebinding_user_keeps_old_connection_anonymous() {
        // テスト項目: 付け替え後も古い接続はブロードキャスト対象として残る
        // given (前提条件):
        let registry = ConnectionRegistry::new();
        let (old, _rx_old) = create_handle();
        let (new, _rx_new) = create_handle();
        let alice = user(7);
        registry.register(old.clone(), Some(&alice)).await;

        // when (操作):
        registry.register(new.clone(), Some(&alice)).await;

        // then (期待する結果):
        assert_eq!(registry.count().await, 2);
        let found = registry.lookup_connection_for_user(alice.id).await;
        assert_eq!(found.map(|h| h.id()), Some(new.id()));
    }

    #[tokio::test]
    async fn test_send_to_dropped_connection_fails() {
        // テスト項目: 受信側が破棄された接続への送信は TransportError になる
        // given (前提条件):
        let (handle, rx) = create_handle();
        drop(rx);

        // when (操作):
        let result = handle.send("hello".to_string());

        // then (期待する結果):
        assert_eq!(result, Err(TransportError::Closed(handle.id())));
    }

    #[tokio::test]
    async fn test_send_to_stalled_connection_fails() {
        // テスト項目: バッファが埋まった接続への送信は待たずに TransportError::Full になる
        // given (前提条件):
        let (tx, mut rx) = mpsc::channel(2);
        let handle = ConnectionHandle::new(ConnectionId::generate(), tx);
        handle.send("one".to_string()).unwrap();
        handle.send("two".to_string()).unwrap();

        // when (操作):
        let result = handle.send("three".to_string());

        // then (期待する結果):
        assert_eq!(result, Err(TransportError::Full(handle.id())));
        assert_eq!(rx.recv().await, Some("one".to_string()));
        assert_eq!(rx.recv().await, Some("two".to_string()));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_concurrent_register_and_unregister() {
        // テスト項目: 多数のタスクから同時に登録・解除しても更新が失われない
        // given (前提条件):
        let registry = Arc::new(ConnectionRegistry::new());
        let mut tasks = Vec::new();

        // when (操作): 100 接続を並行に登録し、偶数番目だけ解除する
        for i in 0..100 {
            let registry = registry.clone();
            tasks.push(tokio::spawn(async move {
                let (handle, rx) = create_handle();
                registry.register(handle.clone(), Some(&user(i))).await;
                if i % 2 == 0 {
                    registry.unregister(&handle.id()).await;
                }
                rx
            }));
        }
        let mut receivers = Vec::new();
        for task in tasks {
            receivers.push(task.await.unwrap());
        }

        // then (期待する結果):
        assert_eq!(registry.count().await, 50);
        for i in 0..100 {
            let found = registry.lookup_connection_for_user(UserId::new(i)).await;
            assert_eq!(found.is_some(), i % 2 == 1);
        }
    }
}
