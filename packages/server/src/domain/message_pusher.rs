//! MessagePusher trait 定義
//!
//! クライアントへのイベント通知のインターフェース。
//! 送信手段（WebSocket など）は Infrastructure 層が実装します。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ClientId, MessagePushError, OutboundEvent};

/// Outbound channel of one connection (already-encoded frames)
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// MessagePusher trait
///
/// ブロードキャストは fire-and-forget です。一部のクライアントへの送信失敗は
/// 実装側でログに残し、呼び出し元には成功を返します。
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// クライアントの送信チャネルを登録
    async fn register_client(&self, client_id: ClientId, sender: PusherChannel);

    /// クライアントの送信チャネルを削除
    async fn unregister_client(&self, client_id: &ClientId);

    /// 特定のクライアントにイベントを送信
    async fn push_to(
        &self,
        client_id: &ClientId,
        event: &OutboundEvent,
    ) -> Result<(), MessagePushError>;

    /// 指定したクライアント群にイベントを送信
    async fn broadcast(
        &self,
        targets: Vec<ClientId>,
        event: &OutboundEvent,
    ) -> Result<(), MessagePushError>;

    /// 登録済みの全クライアントにイベントを送信
    async fn broadcast_all(&self, event: &OutboundEvent) -> Result<(), MessagePushError>;
}
