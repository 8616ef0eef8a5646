//! PostgreSQL Chat Repository 実装
//!
//! Uses the existing backend schema:
//!
//! - `authtoken_token(key, user_id)`
//! - `"user"(id, username, is_active)`
//! - `chat_room(id, name)`
//! - `chat_message(id, text, created, room_id, user_id)`
//!
//! Integer ids are cast to `BIGINT` in every query so rows decode into `i64`
//! regardless of the column width.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::domain::{
    ChatMessage, ChatRepository, MessageId, MessageText, NewMessage, RepositoryError, Room,
    RoomId, StartupError, User, UserId, ValidationError,
};

const MAX_CONNECTIONS: u32 = 10;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

const TOKEN_EXISTS: &str = "SELECT 1 FROM authtoken_token WHERE key = $1";

const RESOLVE_USER: &str = r#"
    SELECT "user"."id"::BIGINT, "user"."username", "user"."is_active"
    FROM "user"
    INNER JOIN "authtoken_token" ON ("user"."id" = "authtoken_token"."user_id")
    WHERE "authtoken_token"."key" = $1
"#;

const INSERT_MESSAGE: &str = r#"
    WITH inserted AS (
        INSERT INTO chat_message (text, created, room_id, user_id)
        VALUES ($1, $2, $3, $4)
        RETURNING id, room_id
    )
    SELECT inserted.id::BIGINT, chat_room.name
    FROM inserted
    INNER JOIN chat_room ON (chat_room.id = inserted.room_id)
"#;

const RECENT_MESSAGES: &str = r#"
    SELECT "chat_message"."text", "chat_message"."id"::BIGINT, "chat_message"."user_id"::BIGINT,
           "chat_message"."room_id"::BIGINT, "chat_message"."created", "user"."username",
           "chat_room"."name"
    FROM "chat_message"
    INNER JOIN "user" ON ("chat_message"."user_id" = "user"."id")
    INNER JOIN "chat_room" ON ("chat_message"."room_id" = "chat_room"."id")
    ORDER BY "chat_message"."id" DESC
    LIMIT $1
"#;

type MessageRow = (String, i64, i64, i64, DateTime<Utc>, String, String);

/// PostgreSQL 実装
#[derive(Clone)]
pub struct PostgresChatRepository {
    pool: PgPool,
}

impl PostgresChatRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to the database and verify it answers.
    ///
    /// Failure is fatal for the relay: it must not run without persistence.
    pub async fn connect(database_url: &str) -> Result<Self, StartupError> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(database_url)
            .await
            .map_err(|e| StartupError::Database(e.to_string()))?;

        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .map_err(|e| StartupError::Database(e.to_string()))?;

        tracing::info!("Connected to database!");
        Ok(Self::new(pool))
    }
}

fn map_sqlx_error(error: sqlx::Error) -> RepositoryError {
    match error {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            RepositoryError::Unavailable(error.to_string())
        }
        other => RepositoryError::Query(other.to_string()),
    }
}

fn row_to_message(row: MessageRow) -> Result<ChatMessage, RepositoryError> {
    let (text, id, user_id, room_id, created, username, room_name) = row;
    Ok(ChatMessage {
        id: MessageId::new(id),
        text: MessageText::new(text)?,
        // Authors of stored messages are treated as active
        author: User::new(UserId::new(user_id), username, true),
        room: Room::new(RoomId::new(room_id), room_name),
        timestamp: created,
    })
}

#[async_trait]
impl ChatRepository for PostgresChatRepository {
    async fn token_is_valid(&self, token: &str) -> Result<bool, RepositoryError> {
        let row = sqlx::query_scalar::<_, i32>(TOKEN_EXISTS)
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        if row.is_none() {
            tracing::debug!("No token record matches the presented token");
        }
        Ok(row.is_some())
    }

    async fn resolve_user(&self, token: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, (i64, String, bool)>(RESOLVE_USER)
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(|(id, username, active)| User::new(UserId::new(id), username, active)))
    }

    async fn save_message(&self, message: NewMessage) -> Result<ChatMessage, RepositoryError> {
        let author = message.author.clone().ok_or(ValidationError::EmptyAuthor)?;
        let room_id = message.room_id();

        let (id, room_name) = sqlx::query_as::<_, (i64, String)>(INSERT_MESSAGE)
            .bind(message.text.as_str())
            .bind(message.timestamp)
            .bind(room_id.value())
            .bind(author.id.value())
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(ChatMessage {
            id: MessageId::new(id),
            text: message.text,
            author,
            room: Room::new(room_id, room_name),
            timestamp: message.timestamp,
        })
    }

    async fn recent_messages(&self, limit: usize) -> Result<Vec<ChatMessage>, RepositoryError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query_as::<_, MessageRow>(RECENT_MESSAGES)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .filter_map(|row| match row_to_message(row) {
                Ok(message) => Some(message),
                Err(e) => {
                    tracing::warn!("Skipping stored message that fails validation: {}", e);
                    None
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_relay_shared::time::{Clock, FixedClock};

    #[test]
    fn test_map_sqlx_error_pool_timeout_is_unavailable() {
        // テスト項目: プールのタイムアウトは Unavailable として扱われる
        // given / when:
        let error = map_sqlx_error(sqlx::Error::PoolTimedOut);

        // then (期待する結果):
        assert!(matches!(error, RepositoryError::Unavailable(_)));
    }

    #[test]
    fn test_map_sqlx_error_row_not_found_is_query() {
        // テスト項目: その他のエラーは Query として扱われる
        // given / when:
        let error = map_sqlx_error(sqlx::Error::RowNotFound);

        // then (期待する結果):
        assert!(matches!(error, RepositoryError::Query(_)));
    }

    #[test]
    fn test_row_to_message() {
        // テスト項目: クエリ結果の行がドメインの ChatMessage に変換される
        // given (前提条件):
        let created = FixedClock::from_millis(5_000).now();
        let row: MessageRow = (
            "hello".to_string(),
            11,
            7,
            1,
            created,
            "alice".to_string(),
            "Global".to_string(),
        );

        // when (操作):
        let message = row_to_message(row).unwrap();

        // then (期待する結果):
        assert_eq!(message.id, MessageId::new(11));
        assert_eq!(message.author.username, "alice");
        assert_eq!(message.room, Room::new(RoomId::DEFAULT, "Global"));
        assert_eq!(message.timestamp, created);
    }
}
