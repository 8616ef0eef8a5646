//! InMemory Chat Repository 実装
//!
//! ドメイン層が定義する ChatRepository trait の具体的な実装。
//! トークン・ユーザー・ルーム・メッセージを `Mutex` で守られたマップに保持します。
//! PostgreSQL 実装と同じく author 必須・ルーム存在を検証します（100 文字制限は `MessageText` が保証）。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ChatMessage, ChatRepository, MessageId, NewMessage, RepositoryError, Room,
    RoomId, User, UserId, ValidationError,
};

#[derive(Default)]
struct Store {
    /// token -> user id
    tokens: HashMap<String, UserId>,
    users: HashMap<UserId, User>,
    rooms: HashMap<RoomId, Room>,
    /// Oldest first
    messages: Vec<ChatMessage>,
    next_message_id: i64,
}

/// インメモリ Chat Repository 実装
pub struct InMemoryChatRepository {
    store: Mutex<Store>,
}

impl Default for InMemoryChatRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryChatRepository {
    /// デフォルトルーム（id=1, "Global"）だけを持つリポジトリを作成
    pub fn new() -> Self {
        let mut rooms = HashMap::new();
        rooms.insert(RoomId::DEFAULT, Room::new(RoomId::DEFAULT, "Global"));
        Self {
            store: Mutex::new(Store {
                rooms,
                next_message_id: 1,
                ..Store::default()
            }),
        }
    }

    /// ユーザーとその認証トークンを登録
    pub async fn insert_user(&self, user: User, token: impl Into<String>) {
        let mut store = self.store.lock().await;
        store.tokens.insert(token.into(), user.id);
        store.users.insert(user.id, user);
    }

    /// ルームを登録
    pub async fn insert_room(&self, room: Room) {
        let mut store = self.store.lock().await;
        store.rooms.insert(room.id, room);
    }

    /// 保存済みメッセージ数を取得
    pub async fn count_messages(&self) -> usize {
        self.store.lock().await.messages.len()
    }
}

#[async_trait]
impl ChatRepository for InMemoryChatRepository {
    async fn token_is_valid(&self, token: &str) -> Result<bool, RepositoryError> {
        let store = self.store.lock().await;
        Ok(store.tokens.contains_key(token))
    }

    async fn resolve_user(&self, token: &str) -> Result<Option<User>, RepositoryError> {
        let store = self.store.lock().await;
        Ok(store
            .tokens
            .get(token)
            .and_then(|user_id| store.users.get(user_id))
            .cloned())
    }

    async fn save_message(&self, message: NewMessage) -> Result<ChatMessage, RepositoryError> {
        let room_id = message.room_id();
        let NewMessage {
            text,
            author,
            timestamp,
            ..
        } = message;
        let author = author.ok_or(ValidationError::EmptyAuthor)?;

        let mut store = self.store.lock().await;
        let room = store
            .rooms
            .get(&room_id)
            .cloned()
            .ok_or_else(|| RepositoryError::Query(format!("room {} does not exist", room_id)))?;

        let id = MessageId::new(store.next_message_id);
        store.next_message_id += 1;

        let saved = ChatMessage {
            id,
            text,
            author,
            room,
            timestamp,
        };
        store.messages.push(saved.clone());
        Ok(saved)
    }

    async fn recent_messages(&self, limit: usize) -> Result<Vec<ChatMessage>, RepositoryError> {
        let store = self.store.lock().await;
        Ok(store.messages.iter().rev().take(limit).cloned().collect())
    }
}
