pub mod conversion;
pub mod http;
pub mod websocket;
