//! Repository trait 定義
//!
//! 永続化ストア（チャット履歴・トークン解決）への狭いインターフェース。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{ChatMessage, NewMessage, RepositoryError, User};

/// Chat Repository trait
///
/// UseCase 層はこの trait に依存し、Infrastructure 層の具体的な実装
/// （PostgreSQL / InMemory）には依存しない。
#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// トークンが存在するかどうかを確認（ユーザー解決とは独立した軽量チェック）
    async fn token_is_valid(&self, token: &str) -> Result<bool, RepositoryError>;

    /// トークンに紐づくユーザーを取得
    ///
    /// トークンが存在しない場合は `Ok(None)`。`active` フラグの判定は呼び出し側で行う。
    async fn resolve_user(&self, token: &str) -> Result<Option<User>, RepositoryError>;

    /// メッセージを保存し、ID とルーム情報が確定したメッセージを返す
    ///
    /// 100 文字を超える本文や author のないメッセージは拒否する。
    async fn save_message(&self, message: NewMessage) -> Result<ChatMessage, RepositoryError>;

    /// 直近 `limit` 件のメッセージを新しい順に取得
    async fn recent_messages(&self, limit: usize) -> Result<Vec<ChatMessage>, RepositoryError>;
}
