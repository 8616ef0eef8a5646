//! UseCase layer: the relay's application logic.

pub mod authenticate;
pub mod broadcast;
pub mod connect_participant;
pub mod disconnect_participant;
pub mod error;
pub mod rate_limiter;
pub mod relay_notifications;
pub mod replay_history;
pub mod send_message;

pub use authenticate::AuthenticationGate;
pub use broadcast::BroadcastDispatcher;
pub use connect_participant::{Admission, ConnectParticipantUseCase};
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use error::SendMessageError;
pub use rate_limiter::RateLimiter;
pub use relay_notifications::{Delivery, NotificationRelay};
pub use replay_history::ReplayHistoryUseCase;
pub use send_message::SendMessageUseCase;
