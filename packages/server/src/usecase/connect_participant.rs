//! UseCase: 参加者接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectParticipantUseCase::execute() メソッド
//! - トークンによるユーザーの紐付けと、参加可否（Participant / ReadOnly）の判定
//!
//! ### どのような状況を想定しているか
//! - 正常系：有効なトークンでの接続（ユーザーが紐付き、投稿可能）
//! - 異常系：空・未知のトークン（読み取り専用として登録される）
//! - エッジケース：非アクティブなユーザー（参加は許可されるが投稿者は空）

use std::sync::Arc;

use crate::{
    domain::{AuthError, User},
    infrastructure::{ConnectionHandle, ConnectionRegistry},
    usecase::AuthenticationGate,
};

/// Result of admitting a new connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// The connection may post messages. `author` is `None` when the token is
    /// known but no active user could be bound to it.
    Participant { author: Option<User> },
    /// The connection receives broadcasts but its frames are discarded
    ReadOnly,
}

/// 参加者接続のユースケース
pub struct ConnectParticipantUseCase {
    gate: AuthenticationGate,
    registry: Arc<ConnectionRegistry>,
}

impl ConnectParticipantUseCase {
    pub fn new(gate: AuthenticationGate, registry: Arc<ConnectionRegistry>) -> Self {
        Self { gate, registry }
    }

    /// 接続を Registry に登録し、参加可否を返す
    ///
    /// ユーザーが解決できた場合はそのユーザーに紐付けて登録する（既存の紐付けは
    /// 新しい接続へ移る）。解決できない場合も匿名の接続として登録し、
    /// ブロードキャストは受信できる。
    pub async fn execute(&self, token: &str, handle: ConnectionHandle) -> Admission {
        let author = match self.gate.authenticate(token).await {
            Ok(user) => Some(user),
            Err(AuthError::Unavailable(e)) => {
                tracing::error!("Could not resolve user for connection: {}", e);
                None
            }
            Err(e) => {
                tracing::debug!("No user bound to connection: {}", e);
                None
            }
        };

        let connection_id = handle.id();
        self.registry.register(handle, author.as_ref()).await;

        if self.gate.admits(token).await {
            if let Some(user) = &author {
                tracing::info!(
                    "User {} ({}) joined on connection {}",
                    user.username,
                    user.id,
                    connection_id
                );
            }
            Admission::Participant { author }
        } else {
            tracing::info!("Token not valid, connection {} is read-only", connection_id);
            Admission::ReadOnly
        }
    }
}
