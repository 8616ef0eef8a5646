//! UseCase: 認証ゲート
//!
//! トークンからユーザーを解決し、接続がチャットに参加できるかを判定します。
//! 参加可否の判定（`admits`）はユーザー解決とは独立した軽量なトークン存在チェックです。

use std::sync::Arc;

use crate::domain::{AuthError, ChatRepository, User};

/// Authentication Gate
pub struct AuthenticationGate {
    repository: Arc<dyn ChatRepository>,
}

impl AuthenticationGate {
    pub fn new(repository: Arc<dyn ChatRepository>) -> Self {
        Self { repository }
    }

    /// トークンに紐づくアクティブなユーザーを取得
    ///
    /// 空のトークンは存在しないトークンと同じ扱い（`AuthError::NotFound`）。
    pub async fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        if token.is_empty() {
            return Err(AuthError::NotFound);
        }

        let user = self
            .repository
            .resolve_user(token)
            .await?
            .ok_or(AuthError::NotFound)?;

        if !user.active {
            return Err(AuthError::Inactive);
        }
        Ok(user)
    }

    /// トークンが存在する場合のみ参加を許可
    ///
    /// 永続化ストアのエラーは「許可しない」として扱う。
    pub async fn admits(&self, token: &str) -> bool {
        if token.is_empty() {
            return false;
        }

        match self.repository.token_is_valid(token).await {
            Ok(valid) => valid,
            Err(e) => {
                tracing::error!("Token validity check failed: {}", e);
                false
            }
        }
    }
}
