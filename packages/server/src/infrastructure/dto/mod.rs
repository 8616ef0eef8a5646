//! Data Transfer Objects (DTOs) for the chat relay.
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket envelope and payload DTOs
//! - `http`: HTTP API response DTOs
//!
//! `codec` turns domain values into wire frames and back.

pub mod codec;
pub mod conversion;
pub mod http;
pub mod websocket;
