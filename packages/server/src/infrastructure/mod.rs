//! Infrastructure layer.
//!
//! ドメイン層が定義する trait の具体的な実装（インメモリストア、WebSocket 送信）と、
//! ワイヤ形式の DTO を提供します。

pub mod dto;
pub mod message_pusher;
pub mod repository;
