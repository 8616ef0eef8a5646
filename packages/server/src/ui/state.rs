//! Shared application state.

use std::sync::Arc;

use crate::{
    infrastructure::ConnectionRegistry,
    usecase::{
        ConnectParticipantUseCase, DisconnectParticipantUseCase, ReplayHistoryUseCase,
        SendMessageUseCase,
    },
};

/// Origins allowed to open a WebSocket connection.
///
/// Entries are compared verbatim against the request's `Origin` header.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    allowed: Vec<String>,
}

impl OriginPolicy {
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    /// A missing origin is never allowed
    pub fn allows(&self, origin: Option<&str>) -> bool {
        origin.is_some_and(|origin| self.allowed.iter().any(|allowed| allowed == origin))
    }
}

/// Shared application state
pub struct AppState {
    /// ConnectParticipantUseCase（参加者接続のユースケース）
    pub connect_participant_usecase: Arc<ConnectParticipantUseCase>,
    /// DisconnectParticipantUseCase（参加者切断のユースケース）
    pub disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    /// SendMessageUseCase（メッセージ送信のユースケース）
    pub send_message_usecase: Arc<SendMessageUseCase>,
    /// ReplayHistoryUseCase（履歴再送のユースケース）
    pub replay_history_usecase: Arc<ReplayHistoryUseCase>,
    pub registry: Arc<ConnectionRegistry>,
    pub origin_policy: OriginPolicy,
}
