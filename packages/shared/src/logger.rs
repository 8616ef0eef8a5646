//! Logging setup utilities for the chat relay.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with the specified default log level.
///
/// Logging is enabled for the server library crate and for the binary.
/// The filter can be overridden using the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "chat-relay-server")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use chat_relay_shared::logger::setup_logger;
///
/// setup_logger("chat-relay-server", "info");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Target of the server library crate.
const LIBRARY_TARGET: &str = "chat_relay_server";

/// Build the `EnvFilter` directive used when `RUST_LOG` is not set.
///
/// The binary's target is only added when it differs from the library's.
fn default_filter(binary_name: &str, default_log_level: &str) -> String {
    let binary_target = binary_name.replace('-', "_");
    if binary_target == LIBRARY_TARGET {
        format!("{}={}", LIBRARY_TARGET, default_log_level)
    } else {
        format!(
            "{}={},{}={}",
            LIBRARY_TARGET, default_log_level, binary_target, default_log_level
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_has_single_directive_for_server_binary() {
        // テスト項目: バイナリとライブラリのターゲットが同じなら指定は 1 つだけになる
        // given (前提条件):
        let binary_name = "chat-relay-server";

        // when (操作):
        let filter = default_filter(binary_name, "debug");

        // then (期待する結果):
        assert_eq!(filter, "chat_relay_server=debug");
    }

    #[test]
    fn test_default_filter_normalizes_binary_name() {
        // テスト項目: 別名のバイナリはハイフンをアンダースコアに変換して追加される
        // given (前提条件):
        let binary_name = "relay-tool";

        // when (操作):
        let filter = default_filter(binary_name, "warn");

        // then (期待する結果):
        assert_eq!(filter, "chat_relay_server=warn,relay_tool=warn");
    }
}
