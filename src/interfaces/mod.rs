//! Interface adapters: REST API and realtime WebSocket

pub mod http;
pub mod ws;
