//! UseCase: Room Coordinator
//!
//! ルームごとの Mutex を取得してから状態を変更し、スナップショットを
//! ブロードキャストし終えるまでロックを保持します。これにより同じルームへの
//! 操作は1つずつ順番に処理され、全クライアントが同じ順序で状態を受け取ります。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - 各操作がルームの状態を変更し、オーディエンス全体へスナップショットを送ること
//! - 拒否された操作はブロードキャストを発生させないこと
//! - resetUsers が forceLogout → スナップショットの順で送信されること
//! - 同時に届いた投票がすべて反映されること

use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use huddle_shared::time::Clock;
use rand::{SeedableRng, rngs::StdRng};

use crate::domain::{
    ClientId, JoinOutcome, MessagePusher, OutboundEvent, ParticipantName, PusherChannel,
    ReactionSymbol, Room, RoomError, RoomId, RoomRepository, RoomState, Timestamp, Trajectory,
    VoteValue,
};

use super::error::UseCaseError;

/// ルーム操作のユースケース
pub struct RoomCoordinator {
    /// RoomRepository（ライブのルームの管理）
    rooms: Arc<dyn RoomRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
    /// Reaction trajectory source
    rng: StdMutex<StdRng>,
}

impl RoomCoordinator {
    pub fn new(
        rooms: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::with_rng(rooms, message_pusher, clock, StdRng::from_entropy())
    }

    /// Same as `new` with a caller-provided random source.
    pub fn with_rng(
        rooms: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
        rng: StdRng,
    ) -> Self {
        Self {
            rooms,
            message_pusher,
            clock,
            rng: StdMutex::new(rng),
        }
    }

    /// Register a new connection and send it the current snapshot.
    pub async fn attach(
        &self,
        room_id: &RoomId,
        connection: ClientId,
        sender: PusherChannel,
    ) -> RoomState {
        self.message_pusher
            .register_client(connection.clone(), sender)
            .await;

        let handle = self.rooms.get_or_create(room_id).await;
        let mut room = handle.lock().await;
        room.attach(connection.clone());

        let snapshot = room.snapshot();
        let event = OutboundEvent::RoomState(snapshot.clone());
        if let Err(e) = self.message_pusher.push_to(&connection, &event).await {
            tracing::warn!("Failed to send initial snapshot to '{}': {}", connection, e);
        }
        tracing::info!("Connection '{}' attached to room '{}'", connection, room_id);
        snapshot
    }

    /// Connection closed: leave the audience and go offline.
    pub async fn detach(&self, room_id: &RoomId, connection: &ClientId) {
        if let Some(handle) = self.rooms.get(room_id).await {
            let mut room = handle.lock().await;
            room.detach(connection);
            if room.disconnect(connection) {
                self.broadcast_snapshot(&room).await;
            }
        }
        self.message_pusher.unregister_client(connection).await;
        tracing::info!("Connection '{}' detached from room '{}'", connection, room_id);
    }

    pub async fn join(
        &self,
        room_id: &RoomId,
        connection: &ClientId,
        name: ParticipantName,
    ) -> Result<RoomState, UseCaseError> {
        let now = Timestamp::new(self.clock.now_millis());
        self.mutate(room_id, "join", |room| {
            match room.join(connection.clone(), name.clone(), now) {
                JoinOutcome::Created => {
                    tracing::info!("'{}' joined room '{}'", name.as_str(), room.id)
                }
                JoinOutcome::Rebound { previous } => tracing::info!(
                    "'{}' rejoined room '{}' ({} -> {})",
                    name.as_str(),
                    room.id,
                    previous,
                    connection
                ),
            }
            Ok(())
        })
        .await
    }

    pub async fn cast_vote(
        &self,
        room_id: &RoomId,
        participant_id: &ClientId,
        value: VoteValue,
    ) -> Result<RoomState, UseCaseError> {
        self.mutate(room_id, "vote", |room| room.cast_vote(participant_id, value))
            .await
    }

    pub async fn reveal(&self, room_id: &RoomId) -> Result<RoomState, UseCaseError> {
        self.mutate(room_id, "reveal", |room| {
            room.reveal();
            Ok(())
        })
        .await
    }

    pub async fn reset(&self, room_id: &RoomId) -> Result<RoomState, UseCaseError> {
        self.mutate(room_id, "reset", |room| {
            room.reset();
            Ok(())
        })
        .await
    }

    pub async fn recalculate_average(&self, room_id: &RoomId) -> Result<RoomState, UseCaseError> {
        self.mutate(room_id, "recalculateAverage", Room::recalculate_average)
            .await
    }

    /// Drop every participant. Each connection gets `forceLogout`, then the
    /// empty snapshot.
    pub async fn reset_users(&self, room_id: &RoomId) -> Result<RoomState, UseCaseError> {
        let handle = self.rooms.get_or_create(room_id).await;
        let mut room = handle.lock().await;
        room.reset_users();
        tracing::info!("All participants of room '{}' were reset", room_id);

        self.broadcast(&room, OutboundEvent::ForceLogout).await;
        Ok(self.broadcast_snapshot(&room).await)
    }

    pub async fn throw_reaction(
        &self,
        room_id: &RoomId,
        from: &ClientId,
        target: &ClientId,
        symbol: ReactionSymbol,
    ) -> Result<RoomState, UseCaseError> {
        let trajectory = self.next_trajectory();

        let handle = self.rooms.get_or_create(room_id).await;
        let mut room = handle.lock().await;
        if let Err(e) = room.throw_reaction(from, target, symbol.clone()) {
            tracing::warn!("Rejected 'throwReaction' in room '{}': {}", room_id, e);
            return Err(e.into());
        }

        let event = OutboundEvent::ReactionThrown {
            target_id: target.clone(),
            from_id: from.clone(),
            symbol,
            trajectory,
        };
        self.broadcast(&room, event).await;
        Ok(self.broadcast_snapshot(&room).await)
    }

    /// Mark a participant offline. The participant stays listed.
    pub async fn disconnect(
        &self,
        room_id: &RoomId,
        participant_id: &ClientId,
    ) -> Result<RoomState, UseCaseError> {
        self.mutate(room_id, "disconnect", |room| {
            if room.disconnect(participant_id) {
                Ok(())
            } else {
                Err(RoomError::ParticipantNotFound(participant_id.to_string()))
            }
        })
        .await
    }

    /// Current state of an existing room.
    pub async fn snapshot(&self, room_id: &RoomId) -> Result<RoomState, UseCaseError> {
        let handle = self
            .rooms
            .get(room_id)
            .await
            .ok_or_else(|| UseCaseError::NotFound(format!("room '{}'", room_id)))?;
        let room = handle.lock().await;
        Ok(room.snapshot())
    }

    async fn mutate<F>(
        &self,
        room_id: &RoomId,
        action: &str,
        apply: F,
    ) -> Result<RoomState, UseCaseError>
    where
        F: FnOnce(&mut Room) -> Result<(), RoomError> + Send,
    {
        let handle = self.rooms.get_or_create(room_id).await;
        let mut room = handle.lock().await;
        if let Err(e) = apply(&mut room) {
            tracing::warn!("Rejected '{}' in room '{}': {}", action, room_id, e);
            return Err(e.into());
        }
        Ok(self.broadcast_snapshot(&room).await)
    }

    async fn broadcast_snapshot(&self, room: &Room) -> RoomState {
        let snapshot = room.snapshot();
        self.broadcast(room, OutboundEvent::RoomState(snapshot.clone()))
            .await;
        snapshot
    }

    async fn broadcast(&self, room: &Room, event: OutboundEvent) {
        if let Err(e) = self.message_pusher.broadcast(room.audience(), &event).await {
            tracing::warn!(
                "Failed to broadcast '{}' in room '{}': {}",
                event.kind(),
                room.id,
                e
            );
        }
    }

    fn next_trajectory(&self) -> Trajectory {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        Trajectory::random(&mut *rng)
    }
}
