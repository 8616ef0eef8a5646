//! Real-time chat relay library.
//!
//! Clients connect over WebSocket, receive recent history and live chat
//! broadcasts, and get notifications popped from an external queue.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
