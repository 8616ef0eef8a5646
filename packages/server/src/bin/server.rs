//! Chat relay server.
//!
//! Connects to PostgreSQL and Redis, then serves the WebSocket relay.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin chat-relay-server
//! cargo run --bin chat-relay-server -- --port 8412 --redis-addr localhost:6379
//! ```

use std::sync::Arc;

use chat_relay_server::{
    config::Config,
    domain::StartupError,
    infrastructure::{
        ConnectionRegistry, notification_source::RedisNotificationSource,
        repository::PostgresChatRepository,
    },
    ui::{AppState, OriginPolicy, Server},
    usecase::{
        AuthenticationGate, BroadcastDispatcher, ConnectParticipantUseCase,
        DisconnectParticipantUseCase, NotificationRelay, RateLimiter, ReplayHistoryUseCase,
        SendMessageUseCase,
    },
};
use chat_relay_shared::{logger::setup_logger, time::SystemClock};
use clap::Parser;

#[tokio::main]
async fn main() {
    let config = Config::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &config.log_level);
    tracing::debug!("{:?}", config);

    if let Err(e) = run(config).await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<(), StartupError> {
    // Initialize dependencies in order:
    // 1. Repository
    // 2. Notification source
    // 3. Registry, dispatcher and notification relay
    // 4. UseCases
    // 5. Server

    // 1. Repository (PostgreSQL)
    let repository = Arc::new(PostgresChatRepository::connect(&config.database_url()).await?);
    tracing::info!("Connected to database");

    // 2. Notification source (Redis list)
    let source = Arc::new(
        RedisNotificationSource::connect(
            config.redis_connection_info()?,
            config.notify_channel.clone(),
        )
        .await?,
    );
    tracing::info!("Connected to redis at {}", config.redis_addr);

    // 3. Long-lived tasks
    let registry = Arc::new(ConnectionRegistry::new());
    let (dispatcher, _dispatcher_task) = BroadcastDispatcher::spawn(registry.clone());
    let limiter = Arc::new(RateLimiter::new(
        config.rate_limit_ceiling,
        config.rate_limit_window(),
    ));
    let _window_task = limiter.spawn_window_reset();
    let _relay_task = NotificationRelay::new(source, limiter, registry.clone()).spawn();

    // 4. UseCases
    let connect_participant_usecase = Arc::new(ConnectParticipantUseCase::new(
        AuthenticationGate::new(repository.clone()),
        registry.clone(),
    ));
    let disconnect_participant_usecase =
        Arc::new(DisconnectParticipantUseCase::new(registry.clone()));
    let send_message_usecase = Arc::new(SendMessageUseCase::new(
        repository.clone(),
        dispatcher,
        Arc::new(SystemClock),
    ));
    let replay_history_usecase = Arc::new(ReplayHistoryUseCase::new(repository));

    // 5. Create and run the server
    let server = Server::new(AppState {
        connect_participant_usecase,
        disconnect_participant_usecase,
        send_message_usecase,
        replay_history_usecase,
        registry,
        origin_policy: OriginPolicy::new(config.allowed_origins),
    });
    server.run(&config.host, config.port).await
}
