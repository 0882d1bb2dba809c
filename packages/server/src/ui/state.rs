//! Server state and dependency wiring.

use std::{collections::HashMap, sync::Arc};

use huddle_shared::time::Clock;
use tokio::sync::Mutex;

use crate::{
    infrastructure::{
        message_pusher::WebSocketMessagePusher,
        repository::{
            InMemoryRoomRepository, InMemorySessionLedgerRepository, InMemoryStatsRepository,
            InMemoryUserDirectory,
        },
    },
    usecase::{RoomCoordinator, SessionLedgerUseCase, StatisticsAggregator},
};

/// Shared application state
pub struct AppState {
    pub room_coordinator: Arc<RoomCoordinator>,
    pub session_ledger: Arc<SessionLedgerUseCase>,
    pub statistics_aggregator: Arc<StatisticsAggregator>,
}

impl AppState {
    pub fn new(
        room_coordinator: Arc<RoomCoordinator>,
        session_ledger: Arc<SessionLedgerUseCase>,
        statistics_aggregator: Arc<StatisticsAggregator>,
    ) -> Self {
        Self {
            room_coordinator,
            session_ledger,
            statistics_aggregator,
        }
    }

    /// Wire every use case over the in-memory stores and one WebSocket pusher.
    ///
    /// Dependencies are created in order:
    /// 1. Repositories
    /// 2. MessagePusher
    /// 3. UseCases
    pub fn in_memory(clock: Arc<dyn Clock>, active_window_days: u32) -> Self {
        // 1. Repositories
        let rooms = Arc::new(InMemoryRoomRepository::new(clock.clone()));
        let ledger = Arc::new(InMemorySessionLedgerRepository::new());
        let stats = Arc::new(InMemoryStatsRepository::new());
        let users = Arc::new(InMemoryUserDirectory::new());

        // 2. MessagePusher (room connections and statsChanged share one registry)
        let message_pusher = Arc::new(WebSocketMessagePusher::new(Arc::new(Mutex::new(
            HashMap::new(),
        ))));

        // 3. UseCases
        let room_coordinator = Arc::new(RoomCoordinator::new(
            rooms,
            message_pusher.clone(),
            clock.clone(),
        ));
        let statistics_aggregator = Arc::new(StatisticsAggregator::new(
            ledger.clone(),
            stats,
            users.clone(),
            message_pusher,
            clock.clone(),
            active_window_days,
        ));
        let session_ledger = Arc::new(SessionLedgerUseCase::new(
            ledger,
            users,
            statistics_aggregator.clone(),
            clock,
        ));

        Self::new(room_coordinator, session_ledger, statistics_aggregator)
    }
}
