//! MessagePusher の実装
//!
//! - `websocket`: 接続ごとの送信チャネルに JSON フレームを流す実装

pub mod websocket;

pub use websocket::WebSocketMessagePusher;
