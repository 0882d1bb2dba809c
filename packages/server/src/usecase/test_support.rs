//! Test doubles shared by the use case tests.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ClientId, MessagePushError, MessagePusher, OutboundEvent, PusherChannel};

/// Where an event was sent.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    To(ClientId),
    Broadcast(Vec<ClientId>),
    All,
}

/// MessagePusher that records every push instead of sending it.
#[derive(Default)]
pub struct RecordingPusher {
    sent: Mutex<Vec<(Delivery, OutboundEvent)>>,
}

impl RecordingPusher {
    /// Drain everything recorded so far.
    pub async fn take(&self) -> Vec<(Delivery, OutboundEvent)> {
        std::mem::take(&mut *self.sent.lock().await)
    }
}

#[async_trait]
impl MessagePusher for RecordingPusher {
    async fn register_client(&self, _client_id: ClientId, _sender: PusherChannel) {
        // No-op for mock
    }

    async fn unregister_client(&self, _client_id: &ClientId) {
        // No-op for mock
    }

    async fn push_to(
        &self,
        client_id: &ClientId,
        event: &OutboundEvent,
    ) -> Result<(), MessagePushError> {
        self.sent
            .lock()
            .await
            .push((Delivery::To(client_id.clone()), event.clone()));
        Ok(())
    }

    async fn broadcast(
        &self,
        targets: Vec<ClientId>,
        event: &OutboundEvent,
    ) -> Result<(), MessagePushError> {
        self.sent
            .lock()
            .await
            .push((Delivery::Broadcast(targets), event.clone()));
        Ok(())
    }

    async fn broadcast_all(&self, event: &OutboundEvent) -> Result<(), MessagePushError> {
        self.sent.lock().await.push((Delivery::All, event.clone()));
        Ok(())
    }
}
