//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{RepositoryError, ValidationError};

/// メッセージ送信のエラー
#[derive(Debug, Error)]
pub enum SendMessageError {
    /// 本文・author の検証に失敗（メッセージは破棄される）
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// 保存に失敗（ブロードキャストしない）
    #[error(transparent)]
    Persistence(#[from] RepositoryError),

    /// ブロードキャストキューが停止している
    #[error("Broadcast dispatcher is not running")]
    DispatcherStopped,
}
