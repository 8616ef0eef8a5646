//! Redis list notification source.
//!
//! Other backend services `RPUSH` JSON encoded events onto a list
//! (`TSG_NOTIFY` by default); the relay consumes them with `BLPOP`.

use async_trait::async_trait;
use redis::{
    Client, ConnectionAddr, ConnectionInfo, RedisConnectionInfo, aio::ConnectionManager,
};

use crate::domain::{NotificationSource, SourceError, StartupError};

/// Seconds a single `BLPOP` waits before it is reissued
const BLPOP_TIMEOUT_SECS: u64 = 5;

/// Port used when the address has none
const DEFAULT_REDIS_PORT: u16 = 6379;

pub struct RedisNotificationSource {
    manager: ConnectionManager,
    list_key: String,
}

impl RedisNotificationSource {
    /// Connect to Redis and verify the connection with `PING`.
    pub async fn connect(
        info: ConnectionInfo,
        list_key: impl Into<String>,
    ) -> Result<Self, StartupError> {
        tracing::info!("Connecting with Redis...");

        let client =
            Client::open(info).map_err(|e| StartupError::NotificationSource(e.to_string()))?;
        let mut manager = ConnectionManager::new(client)
            .await
            .map_err(|e| StartupError::NotificationSource(e.to_string()))?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut manager)
            .await
            .map_err(|e| StartupError::NotificationSource(e.to_string()))?;

        let list_key = list_key.into();
        tracing::info!(
            "Successfully connected with Redis, listening on list '{}'",
            list_key
        );
        Ok(Self { manager, list_key })
    }
}

#[async_trait]
impl NotificationSource for RedisNotificationSource {
    async fn pop(&self) -> Result<String, SourceError> {
        let mut conn = self.manager.clone();
        loop {
            let popped = redis::cmd("BLPOP")
                .arg(&self.list_key)
                .arg(BLPOP_TIMEOUT_SECS)
                .query_async::<_, Option<(String, String)>>(&mut conn)
                .await
                .map_err(|e| SourceError::Unavailable(e.to_string()))?;

            if let Some((_key, payload)) = popped {
                return Ok(payload);
            }
        }
    }
}

/// Build Redis connection settings from a `host[:port]` address and an optional password.
///
/// The password is passed through as is, so it may contain URL reserved characters.
pub fn redis_connection_info(addr: &str, password: &str) -> Result<ConnectionInfo, StartupError> {
    let (host, port) = match addr.rsplit_once(':') {
        Some((host, port)) => {
            let port = port.parse::<u16>().map_err(|e| {
                StartupError::NotificationSource(format!("invalid redis port in '{}': {}", addr, e))
            })?;
            (host, port)
        }
        None => (addr, DEFAULT_REDIS_PORT),
    };
    if host.is_empty() {
        return Err(StartupError::NotificationSource(format!(
            "missing redis host in '{}'",
            addr
        )));
    }

    Ok(ConnectionInfo {
        addr: ConnectionAddr::Tcp(host.to_string(), port),
        redis: RedisConnectionInfo {
            db: 0,
            password: (!password.is_empty()).then(|| password.to_string()),
            ..Default::default()
        },
    })
}
