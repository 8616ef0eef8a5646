//! NotificationSource の実装
//!
//! - `redis_list`: Redis のリストに対するブロッキング POP
//! - `inmemory`: テスト用のチャンネル実装

pub mod inmemory;
pub mod redis_list;

pub use inmemory::InMemoryNotificationSource;
pub use redis_list::{RedisNotificationSource, redis_connection_info};
