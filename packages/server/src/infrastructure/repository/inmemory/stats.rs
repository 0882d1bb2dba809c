//! InMemory Statistics Repository 実装
//!
//! ユーザー集計と全体集計を1つの Mutex で保護し、各操作をロック内で完結させます。
//! 全体集計への畳み込みは processedSessionIds の確認と加算を同じロックの中で
//! 行うため、同じセッションが2回加算されることはありません。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    GlobalStatsAggregate, ReactionSymbol, RepositoryError, SessionFold, SessionId,
    StatsRepository, Timestamp, UserId, UserSessionFold, UserStatsAggregate,
};

struct StatsState {
    users: HashMap<UserId, UserStatsAggregate>,
    global: GlobalStatsAggregate,
}

impl StatsState {
    fn user_mut(&mut self, user_id: &UserId, now: Timestamp) -> &mut UserStatsAggregate {
        self.users
            .entry(*user_id)
            .or_insert_with(|| UserStatsAggregate::new(*user_id, now))
    }
}

/// インメモリ Statistics Repository 実装
pub struct InMemoryStatsRepository {
    state: Mutex<StatsState>,
}

impl InMemoryStatsRepository {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StatsState {
                users: HashMap::new(),
                global: GlobalStatsAggregate::new(Timestamp::new(0)),
            }),
        }
    }
}

impl Default for InMemoryStatsRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StatsRepository for InMemoryStatsRepository {
    async fn apply_user_fold(
        &self,
        user_id: &UserId,
        fold: &UserSessionFold,
        now: Timestamp,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        state.user_mut(user_id, now).apply_session(fold, now);
        Ok(())
    }

    async fn apply_user_completion(
        &self,
        user_id: &UserId,
        now: Timestamp,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        state.user_mut(user_id, now).apply_completion(now);
        Ok(())
    }

    async fn apply_session_fold(
        &self,
        fold: &SessionFold,
        now: Timestamp,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock().await;
        Ok(state.global.apply_session(fold, now))
    }

    async fn is_session_processed(&self, session_id: &SessionId) -> Result<bool, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.global.is_processed(session_id))
    }

    async fn apply_global_completion(&self, now: Timestamp) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        state.global.apply_completion(now);
        Ok(())
    }

    async fn record_reaction(
        &self,
        sender_id: &UserId,
        target_id: &UserId,
        symbol: &ReactionSymbol,
        now: Timestamp,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        state.user_mut(sender_id, now).record_sent(symbol, now);
        state.user_mut(target_id, now).record_received(symbol, now);
        state.global.record_reaction(symbol, now);
        Ok(())
    }

    async fn set_user_counts(
        &self,
        total_users: u64,
        active_users: u64,
        now: Timestamp,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        state.global.set_user_counts(total_users, active_users, now);
        Ok(())
    }

    async fn user_stats(&self, user_id: &UserId) -> Result<UserStatsAggregate, RepositoryError> {
        let state = self.state.lock().await;
        state
            .users
            .get(user_id)
            .cloned()
            .ok_or_else(|| RepositoryError::UserStatsNotFound(user_id.to_string()))
    }

    async fn global_stats(&self) -> Result<GlobalStatsAggregate, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.global.clone())
    }
}
