//! UseCase: 参加者切断処理
//!
//! 接続を Registry から解除します。読み取りループの終了と送信失敗のどちらから
//! 呼ばれても安全なように、解除は冪等です。

use std::sync::Arc;

use crate::{domain::ConnectionId, infrastructure::ConnectionRegistry};

/// 参加者切断のユースケース
pub struct DisconnectParticipantUseCase {
    registry: Arc<ConnectionRegistry>,
}

impl DisconnectParticipantUseCase {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// 接続を解除する
    ///
    /// 登録されていた場合は `true`、既に解除済みの場合は `false` を返す。
    pub async fn execute(&self, connection_id: &ConnectionId) -> bool {
        let removed = self.registry.unregister(connection_id).await;
        if removed {
            tracing::info!(
                "Connection {} closed ({} remaining)",
                connection_id,
                self.registry.count().await
            );
        }
        removed
    }
}
