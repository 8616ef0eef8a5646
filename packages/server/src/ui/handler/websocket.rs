//! WebSocket connection handlers.
//!
//! One task pair per connection: `pusher_loop` drains the connection's
//! outbound channel into the socket, while the read side either runs the
//! chat read loop (participants) or discards inbound frames (read-only).
//! Whichever side finishes first aborts the other, and the connection is
//! unregistered exactly once afterwards.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode, header::ORIGIN},
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use serde::Deserialize;
use tokio::task::JoinHandle;

use crate::{
    domain::{ConnectionId, ConnectionPhase, HistoryAmount, User, ValidationError},
    infrastructure::{
        ConnectionHandle, PusherReceiver,
        dto::codec::{decode_submission, encode_chat},
        pusher_channel,
    },
    ui::state::AppState,
    usecase::{Admission, SendMessageError},
};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    #[serde(default)]
    pub token: Option<String>,
    /// Kept as a string so that non-numeric values fall back to the default
    #[serde(default)]
    pub amount: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, StatusCode> {
    let origin = headers.get(ORIGIN).and_then(|value| value.to_str().ok());
    if !state.origin_policy.allows(origin) {
        tracing::warn!("Origin {} is not allowed!", origin.unwrap_or("<missing>"));
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, query)))
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
///
/// The task ends when the socket write fails or the channel closes.
fn pusher_loop(
    mut rx: PusherReceiver,
    mut sender: SplitSink<WebSocket, Message>,
    connection_id: ConnectionId,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Err(e) = sender.send(Message::Text(msg.into())).await {
                tracing::warn!("Write to connection {} failed: {}", connection_id, e);
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, query: ConnectQuery) {
    let connection_id = ConnectionId::generate();
    let mut phase = ConnectionPhase::Upgrading;
    let token = query.token.unwrap_or_default();
    let amount = HistoryAmount::parse(query.amount.as_deref());
    tracing::info!("Connection {} upgraded", connection_id);

    let (tx, rx) = pusher_channel();
    let handle = ConnectionHandle::new(connection_id, tx);

    // History goes into the channel before registration so that it always
    // precedes live broadcasts.
    phase.advance(ConnectionPhase::HistoryReplay);
    replay_history(&state, &handle, amount).await;

    let admission = state
        .connect_participant_usecase
        .execute(&token, handle)
        .await;

    let (sender, receiver) = socket.split();
    let mut send_task = pusher_loop(rx, sender, connection_id);
    let author = match admission {
        Admission::Participant { author } => {
            phase.advance(ConnectionPhase::Authenticated);
            phase.advance(ConnectionPhase::ReadLoop);
            author
        }
        Admission::ReadOnly => {
            phase.advance(ConnectionPhase::Rejected);
            None
        }
    };
    let mut recv_task = if phase.accepts_messages() {
        tokio::spawn(read_loop(receiver, state.clone(), author, connection_id))
    } else {
        tokio::spawn(discard_loop(receiver, connection_id))
    };

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    phase.advance(ConnectionPhase::Terminated);
    state
        .disconnect_participant_usecase
        .execute(&connection_id)
        .await;
}

/// Queue up to `amount` recent messages, oldest first, on the connection's channel
async fn replay_history(state: &AppState, handle: &ConnectionHandle, amount: HistoryAmount) {
    let history = match state.replay_history_usecase.execute(amount).await {
        Ok(history) => history,
        Err(e) => {
            tracing::error!(
                "Could not load history for connection {}: {}",
                handle.id(),
                e
            );
            return;
        }
    };

    tracing::debug!(
        "Replaying {} messages to connection {}",
        history.len(),
        handle.id()
    );
    for message in &history {
        match encode_chat(message) {
            Ok(frame) => {
                if handle.send(frame).is_err() {
                    return;
                }
            }
            Err(e) => tracing::error!("Could not encode message {}: {}", message.id.value(), e),
        }
    }
}

/// Read loop of an admitted participant
async fn read_loop(
    mut receiver: SplitStream<WebSocket>,
    state: Arc<AppState>,
    author: Option<User>,
    connection_id: ConnectionId,
) {
    while let Some(msg) = receiver.next().await {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                tracing::warn!("Read from connection {} failed: {}", connection_id, e);
                break;
            }
        };

        match msg {
            Message::Text(text) => {
                handle_submission(&state, author.as_ref(), text.as_str()).await;
            }
            Message::Close(_) => {
                tracing::info!("Connection {} requested close", connection_id);
                break;
            }
            _ => {}
        }
    }
}

async fn handle_submission(state: &AppState, author: Option<&User>, text: &str) {
    let submission = match decode_submission(text) {
        Ok(submission) => submission,
        Err(e) => {
            tracing::warn!("{}", e);
            return;
        }
    };

    match state.send_message_usecase.execute(author, submission).await {
        Ok(message) => {
            tracing::debug!("Message {} queued for broadcast", message.id.value());
        }
        Err(SendMessageError::Validation(ValidationError::EmptyAuthor)) => {
            tracing::warn!("Message rejected: no active user bound to connection");
        }
        Err(SendMessageError::Validation(e)) => {
            tracing::warn!("Message rejected: {}", e);
        }
        Err(e) => {
            tracing::error!("Could not send message: {}", e);
        }
    }
}

/// Read side of a read-only connection: inbound frames are dropped until the
/// stream closes.
async fn discard_loop(mut receiver: SplitStream<WebSocket>, connection_id: ConnectionId) {
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(Message::Text(_)) | Ok(Message::Binary(_)) => {
                tracing::debug!("Discarding frame from read-only connection {}", connection_id);
            }
            Ok(_) => {}
        }
    }
}
