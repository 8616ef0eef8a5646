//! UseCase: メッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - 検証 → 保存 → ブロードキャストの順序
//!
//! ### なぜこのテストが必要か
//! - 保存に成功したメッセージだけがブロードキャストされることを保証
//! - 時刻・ルームはサーバー側で決まることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：保存されたメッセージが全接続に届く
//! - 異常系：100 文字超過、投稿者なし、保存失敗（いずれもブロードキャストしない）
//! - エッジケース：ルーム未指定（デフォルトルーム）

use std::sync::Arc;

use chat_relay_shared::time::Clock;
use tokio::sync::Mutex;

use crate::{
    domain::{ChatMessage, ChatRepository, MessageText, NewMessage, User, ValidationError},
    infrastructure::dto::codec::Submission,
    usecase::{BroadcastDispatcher, SendMessageError},
};

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    repository: Arc<dyn ChatRepository>,
    dispatcher: BroadcastDispatcher,
    clock: Arc<dyn Clock>,
    /// Held across save and publish: broadcast order must equal persisted order
    persist_order: Mutex<()>,
}

impl SendMessageUseCase {
    pub fn new(
        repository: Arc<dyn ChatRepository>,
        dispatcher: BroadcastDispatcher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            dispatcher,
            clock,
            persist_order: Mutex::new(()),
        }
    }

    /// メッセージ送信を実行
    ///
    /// 1. 本文と投稿者を検証
    /// 2. サーバー時刻を付与して保存
    /// 3. 保存に成功したメッセージをディスパッチャーへ渡す
    ///
    /// 2 と 3 は全接続で直列化されるため、ブロードキャスト順は保存順（ID 順）と一致する。
    /// 直列化されるのはメッセージ送信だけで、配送や通知の中継は待たされない。
    ///
    /// # Returns
    ///
    /// * `Ok(ChatMessage)` - 保存され、ブロードキャストキューに積まれたメッセージ
    /// * `Err(SendMessageError)` - 検証・保存に失敗（ブロードキャストしない）
    pub async fn execute(
        &self,
        author: Option<&User>,
        submission: Submission,
    ) -> Result<ChatMessage, SendMessageError> {
        let text = MessageText::new(submission.text)?;
        let author = author.ok_or(ValidationError::EmptyAuthor)?;

        let _ordered = self.persist_order.lock().await;
        let saved = self
            .repository
            .save_message(NewMessage {
                text,
                author: Some(author.clone()),
                room: submission.room,
                timestamp: self.clock.now(),
            })
            .await?;

        tracing::debug!(
            "Saved message {} from {} in room {}",
            saved.id.value(),
            saved.author.username,
            saved.room.id.value()
        );
        self.dispatcher.publish(saved.clone())?;
        Ok(saved)
    }
}
