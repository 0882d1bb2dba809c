//! InMemory Room Repository 実装
//!
//! ドメイン層が定義する RoomRepository trait の具体的な実装。
//! RoomId → `Arc<Mutex<Room>>` の HashMap でライブのルームを管理します。
//!
//! マップ全体のロックはルームの取得・作成の間だけ保持し、ルームの状態変更は
//! ルームごとの Mutex で直列化されます。別々のルームへの操作は互いに待ちません。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use huddle_shared::time::Clock;
use tokio::sync::Mutex;

use crate::domain::{Room, RoomHandle, RoomId, RoomRepository, Timestamp};

/// インメモリ Room Repository 実装
pub struct InMemoryRoomRepository {
    rooms: Mutex<HashMap<RoomId, RoomHandle>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryRoomRepository {
    /// 新しい InMemoryRoomRepository を作成
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            clock,
        }
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn get_or_create(&self, room_id: &RoomId) -> RoomHandle {
        let mut rooms = self.rooms.lock().await;
        rooms
            .entry(room_id.clone())
            .or_insert_with(|| {
                tracing::info!("Room '{}' created", room_id);
                Arc::new(Mutex::new(Room::new(
                    room_id.clone(),
                    Timestamp::new(self.clock.now_millis()),
                )))
            })
            .clone()
    }

    async fn get(&self, room_id: &RoomId) -> Option<RoomHandle> {
        let rooms = self.rooms.lock().await;
        rooms.get(room_id).cloned()
    }
}
