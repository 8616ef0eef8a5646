//! Utilities shared by the chat relay server and its tests.

pub mod logger;
pub mod time;
