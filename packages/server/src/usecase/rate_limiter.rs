//! UseCase: 通知のレートリミッター
//!
//! 受信者ごとのカウンターを固定ウィンドウ（デフォルト 500ms）ごとに一斉リセットします。
//! ウィンドウ内で上限（デフォルト 5 件）を超えた通知は破棄され、キューにも積まれません。

use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::{sync::Mutex, task::JoinHandle};

use crate::domain::UserId;

/// Per-recipient counter over a coarse, globally reset window
pub struct RateLimiter {
    counts: Mutex<HashMap<UserId, u32>>,
    ceiling: u32,
    window: Duration,
}

impl RateLimiter {
    pub const DEFAULT_CEILING: u32 = 5;
    pub const DEFAULT_WINDOW: Duration = Duration::from_millis(500);

    pub fn new(ceiling: u32, window: Duration) -> Self {
        Self {
            counts: Mutex::new(HashMap::new()),
            ceiling,
            window,
        }
    }

    /// Count one event for `recipient` and decide whether it may be delivered
    pub async fn allow(&self, recipient: UserId) -> bool {
        let mut counts = self.counts.lock().await;
        let count = counts.entry(recipient).or_insert(0);
        *count = count.saturating_add(1);
        *count <= self.ceiling
    }

    /// Start a new window: every counter is cleared
    pub async fn reset(&self) {
        self.counts.lock().await.clear();
    }

    /// Spawn the task that resets the counters once per window
    pub fn spawn_window_reset(self: &Arc<Self>) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            tracing::info!(
                "Resetting notification limits every {:?} (max {} per user)",
                limiter.window,
                limiter.ceiling
            );
            let mut ticker = tokio::time::interval(limiter.window);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                limiter.reset().await;
            }
        })
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CEILING, Self::DEFAULT_WINDOW)
    }
}
