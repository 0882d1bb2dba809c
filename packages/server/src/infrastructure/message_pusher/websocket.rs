//! WebSocket を使った MessagePusher 実装
//!
//! 接続の受付と送信チャネルの生成は UI 層（`ui/handler/websocket.rs`）が行い、
//! この実装は登録されたチャネルへの送信だけを担います。
//! ドメインイベントは送信前に `OutboundMessage` DTO を経由して JSON に変換されます。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ClientId, MessagePushError, MessagePusher, OutboundEvent, PusherChannel};
use crate::infrastructure::dto::websocket::OutboundMessage;

/// Client channel registry, keyed by connection id
pub type ClientChannels = Arc<Mutex<HashMap<ClientId, PusherChannel>>>;

pub struct WebSocketMessagePusher {
    clients: ClientChannels,
}

impl WebSocketMessagePusher {
    pub fn new(clients: ClientChannels) -> Self {
        Self { clients }
    }

    fn encode(event: &OutboundEvent) -> Result<String, MessagePushError> {
        serde_json::to_string(&OutboundMessage::from(event.clone()))
            .map_err(|e| MessagePushError::EncodeFailed(e.to_string()))
    }

    /// 1クライアントへの送信。失敗はログに残すだけ
    fn send_logged(client_id: &ClientId, sender: &PusherChannel, frame: &str, kind: &str) {
        match sender.send(frame.to_string()) {
            Ok(()) => tracing::debug!("Pushed '{}' to client '{}'", kind, client_id),
            Err(e) => tracing::warn!("Failed to push '{}' to client '{}': {}", kind, client_id, e),
        }
    }
}

impl Default for WebSocketMessagePusher {
    fn default() -> Self {
        Self::new(Arc::new(Mutex::new(HashMap::new())))
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(&self, client_id: ClientId, sender: PusherChannel) {
        let mut clients = self.clients.lock().await;
        tracing::debug!("Client '{}' registered to MessagePusher", client_id);
        clients.insert(client_id, sender);
    }

    async fn unregister_client(&self, client_id: &ClientId) {
        let mut clients = self.clients.lock().await;
        clients.remove(client_id);
        tracing::debug!("Client '{}' unregistered from MessagePusher", client_id);
    }

    async fn push_to(
        &self,
        client_id: &ClientId,
        event: &OutboundEvent,
    ) -> Result<(), MessagePushError> {
        let frame = Self::encode(event)?;
        let clients = self.clients.lock().await;

        let sender = clients
            .get(client_id)
            .ok_or_else(|| MessagePushError::ClientNotFound(client_id.to_string()))?;
        sender
            .send(frame)
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))?;
        tracing::debug!("Pushed '{}' to client '{}'", event.kind(), client_id);
        Ok(())
    }

    async fn broadcast(
        &self,
        targets: Vec<ClientId>,
        event: &OutboundEvent,
    ) -> Result<(), MessagePushError> {
        if targets.is_empty() {
            return Ok(());
        }
        let frame = Self::encode(event)?;
        let clients = self.clients.lock().await;

        for target in targets {
            // ブロードキャストでは一部の送信失敗を許容
            match clients.get(&target) {
                Some(sender) => Self::send_logged(&target, sender, &frame, event.kind()),
                None => tracing::warn!(
                    "Client '{}' not found during broadcast, skipping",
                    target
                ),
            }
        }

        Ok(())
    }

    async fn broadcast_all(&self, event: &OutboundEvent) -> Result<(), MessagePushError> {
        let frame = Self::encode(event)?;
        let clients = self.clients.lock().await;

        for (client_id, sender) in clients.iter() {
            Self::send_logged(client_id, sender, &frame, event.kind());
        }

        Ok(())
    }
}
