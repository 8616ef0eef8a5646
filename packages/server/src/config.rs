//! Command line / environment configuration.

use std::{fmt, time::Duration};

use clap::Parser;
use redis::ConnectionInfo;

use crate::{domain::StartupError, infrastructure::notification_source::redis_connection_info};

/// Chat relay configuration
///
/// Every flag can also be set through the environment variable named next to it.
#[derive(Parser, Clone)]
#[command(name = "chat-relay-server")]
#[command(about = "WebSocket chat relay with rate-limited notification delivery", long_about = None)]
pub struct Config {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "CHAT_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "CHAT_PORT", default_value_t = 8412)]
    pub port: u16,

    /// Full PostgreSQL connection URL; overrides the POSTGRES_* settings
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    #[arg(long, env = "POSTGRES_DB", default_value = "tsg_db")]
    pub postgres_db: String,

    #[arg(long, env = "POSTGRES_USER", default_value = "tsg_user")]
    pub postgres_user: String,

    #[arg(long, env = "POSTGRES_PASSWORD", default_value = "tsg_password")]
    pub postgres_password: String,

    #[arg(long, env = "POSTGRES_HOST", default_value = "localhost")]
    pub postgres_host: String,

    #[arg(long, env = "POSTGRES_PORT", default_value_t = 5432)]
    pub postgres_port: u16,

    /// Redis `host:port`
    #[arg(long, env = "REDIS_ADDR", default_value = "localhost:6379")]
    pub redis_addr: String,

    #[arg(long, env = "REDIS_PASSWORD", default_value = "")]
    pub redis_password: String,

    /// Redis list the notification events are popped from
    #[arg(long, env = "NOTIFY_CHANNEL", default_value = "TSG_NOTIFY")]
    pub notify_channel: String,

    /// Origins allowed to open a WebSocket connection (comma separated)
    #[arg(
        long,
        env = "ALLOWED_ORIGINS",
        value_delimiter = ',',
        default_values = ["https://www.thesharegame.com", "127.0.0.1:8412", "http://localhost:8080"]
    )]
    pub allowed_origins: Vec<String>,

    /// Length of one rate limit window in milliseconds
    #[arg(
        long,
        env = "RATE_LIMIT_WINDOW_MS",
        default_value_t = 500,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub rate_limit_window_ms: u64,

    /// Events delivered to one user per window
    #[arg(long, env = "RATE_LIMIT_CEILING", default_value_t = 5)]
    pub rate_limit_ceiling: u32,

    /// Default log level when RUST_LOG is not set
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Config {
    /// PostgreSQL connection URL
    pub fn database_url(&self) -> String {
        match &self.database_url {
            Some(url) => url.clone(),
            None => format!(
                "postgres://{}:{}@{}:{}/{}",
                self.postgres_user,
                self.postgres_password,
                self.postgres_host,
                self.postgres_port,
                self.postgres_db
            ),
        }
    }

    /// Redis connection settings
    pub fn redis_connection_info(&self) -> Result<ConnectionInfo, StartupError> {
        redis_connection_info(&self.redis_addr, &self.redis_password)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_millis(self.rate_limit_window_ms)
    }
}

const REDACTED: &str = "<redacted>";

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database_url", &self.database_url.as_ref().map(|_| REDACTED))
            .field("postgres_db", &self.postgres_db)
            .field("postgres_user", &self.postgres_user)
            .field("postgres_password", &REDACTED)
            .field("postgres_host", &self.postgres_host)
            .field("postgres_port", &self.postgres_port)
            .field("redis_addr", &self.redis_addr)
            .field("redis_password", &REDACTED)
            .field("notify_channel", &self.notify_channel)
            .field("allowed_origins", &self.allowed_origins)
            .field("rate_limit_window_ms", &self.rate_limit_window_ms)
            .field("rate_limit_ceiling", &self.rate_limit_ceiling)
            .field("log_level", &self.log_level)
            .finish()
    }
}
