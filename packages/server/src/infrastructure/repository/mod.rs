//! ChatRepository の実装
//!
//! - `postgres`: 本番用の PostgreSQL 実装（sqlx）
//! - `inmemory`: テスト・ローカル実行用のインメモリ実装

pub mod inmemory;
pub mod postgres;

pub use inmemory::InMemoryChatRepository;
pub use postgres::PostgresChatRepository;
