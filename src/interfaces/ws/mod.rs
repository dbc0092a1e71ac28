//! WebSocket interfaces
//!
//! - `realtime`: row-change stream with refresh hints for UI clients

pub mod realtime;

pub use realtime::realtime_ws_handler;
