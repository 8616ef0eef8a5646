//! UseCase: 履歴の再送
//!
//! 接続直後のクライアントに送る直近のメッセージを取得します。
//! ストアは新しい順に返すため、古い順に並べ替えて返します。

use std::sync::Arc;

use crate::domain::{ChatMessage, ChatRepository, HistoryAmount, RepositoryError};

pub struct ReplayHistoryUseCase {
    repository: Arc<dyn ChatRepository>,
}

impl ReplayHistoryUseCase {
    pub fn new(repository: Arc<dyn ChatRepository>) -> Self {
        Self { repository }
    }

    /// 直近 `amount` 件を古い順に取得
    pub async fn execute(&self, amount: HistoryAmount) -> Result<Vec<ChatMessage>, RepositoryError> {
        let mut messages = self.repository.recent_messages(amount.value()).await?;
        messages.reverse();
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{MessageId, MessageText, Room, RoomId, User, UserId},
        usecase::test_support::MockChatRepository,
    };
    use chrono::{TimeZone, Utc};

    fn message(id: i64, text: &str) -> ChatMessage {
        ChatMessage {
            id: MessageId::new(id),
            text: MessageText::new(text.to_string()).unwrap(),
            author: User::new(UserId::new(1), "alice", true),
            room: Room::new(RoomId::DEFAULT, "Global"),
            timestamp: Utc.timestamp_millis_opt(id * 1000).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_history_is_oldest_first() {
        // テスト項目: 新しい順のストア結果が古い順に並べ替えられる
        // given (前提条件):
        let mut repository = MockChatRepository::new();
        repository
            .expect_recent_messages()
            .withf(|limit| *limit == 3)
            .returning(|_| Ok(vec![message(3, "C"), message(2, "B"), message(1, "A")]));
        let usecase = ReplayHistoryUseCase::new(Arc::new(repository));

        // when (操作):
        let history = usecase
            .execute(HistoryAmount::parse(Some("3")))
            .await
            .unwrap();

        // then (期待する結果):
        let texts: Vec<&str> = history.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_history_defaults_to_ten() {
        // テスト項目: amount の指定がない場合は 10 件を要求する
        // given (前提条件):
        let mut repository = MockChatRepository::new();
        repository
            .expect_recent_messages()
            .withf(|limit| *limit == 10)
            .returning(|_| Ok(Vec::new()));
        let usecase = ReplayHistoryUseCase::new(Arc::new(repository));

        // when (操作):
        let history = usecase.execute(HistoryAmount::parse(None)).await.unwrap();

        // then (期待する結果):
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_history_store_failure() {
        // テスト項目: ストアのエラーはそのまま返される
        // given (前提条件):
        let mut repository = MockChatRepository::new();
        repository
            .expect_recent_messages()
            .returning(|_| Err(RepositoryError::Query("boom".to_string())));
        let usecase = ReplayHistoryUseCase::new(Arc::new(repository));

        // when (操作):
        let result = usecase.execute(HistoryAmount::default()).await;

        // then (期待する結果):
        assert!(matches!(result, Err(RepositoryError::Query(_))));
    }
}
