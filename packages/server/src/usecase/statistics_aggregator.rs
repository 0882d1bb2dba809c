//! UseCase: Statistics Aggregator
//!
//! 台帳エントリの公開・完了を、ユーザーごとの集計と全体集計に畳み込みます。
//!
//! ## 二重処理の防止
//!
//! 1. エントリ単位: `claim_statistics`（statisticsProcessed の test-and-set）に
//!    勝った呼び出しだけが畳み込みを行う
//! 2. 全体集計: ユーザー集計に触れる前に processedSessionIds を確認し、
//!    登録済みなら何も加算しない
//! 3. `apply_session_fold` が processedSessionIds への登録と加算を
//!    ストア内で一度に行う
//!
//! claim に勝った後でストアへの書き込みが失敗した場合、claim は戻さずに
//! error ログを残します。
//!
//! 公開後に完了したセッションの完了カウントは `claim_completion` で1回だけ
//! 加算されます。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - 同じエントリを2回処理しても集計が変わらないこと
//! - 一部のユーザーの集計失敗が他のユーザーに影響せず、レポートに残ること
//! - 一時的な ID を含むリアクションが変更前に拒否されること

use std::sync::Arc;

use huddle_shared::time::{Clock, days_before};
use serde::Serialize;

use crate::domain::{
    GlobalStatsAggregate, MessagePusher, OutboundEvent, ParticipantRef, ReactionSymbol,
    SessionId, SessionLedgerEntry, SessionLedgerRepository, StatsRepository, Timestamp,
    UserDirectory, UserId, UserStatsAggregate,
};

use super::error::UseCaseError;

/// Default window for counting active users
pub const DEFAULT_ACTIVE_WINDOW_DAYS: u32 = 30;

/// What happened to a session when it was handed to the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AggregationOutcome {
    /// The entry was folded into the aggregates
    Folded,
    /// Only the completion counters were added (folded earlier on reveal)
    CompletionCounted,
    /// Nothing to do, the entry was already handled
    AlreadyProcessed,
    /// The entry has not been revealed yet
    NotRevealed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFoldFailure {
    pub user_id: UserId,
    pub reason: String,
}

/// Result of handing one session to the aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationReport {
    pub session_id: SessionId,
    pub outcome: AggregationOutcome,
    /// Users whose aggregate was updated
    pub folded: Vec<UserId>,
    pub failures: Vec<UserFoldFailure>,
    /// Whether the global aggregate changed
    pub global_applied: bool,
}

impl AggregationReport {
    fn new(session_id: SessionId, outcome: AggregationOutcome) -> Self {
        Self {
            session_id,
            outcome,
            folded: Vec::new(),
            failures: Vec::new(),
            global_applied: false,
        }
    }

    /// No user failed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// 統計集計のユースケース
pub struct StatisticsAggregator {
    ledger: Arc<dyn SessionLedgerRepository>,
    stats: Arc<dyn StatsRepository>,
    users: Arc<dyn UserDirectory>,
    /// MessagePusher（statsChanged の通知）
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
    active_window_days: u32,
}

impl StatisticsAggregator {
    pub fn new(
        ledger: Arc<dyn SessionLedgerRepository>,
        stats: Arc<dyn StatsRepository>,
        users: Arc<dyn UserDirectory>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
        active_window_days: u32,
    ) -> Self {
        Self {
            ledger,
            stats,
            users,
            message_pusher,
            clock,
            active_window_days,
        }
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }

    /// Handle a reveal or completion of `session_id`.
    ///
    /// Safe to call any number of times for the same session.
    pub async fn process_session(
        &self,
        session_id: &SessionId,
    ) -> Result<AggregationReport, UseCaseError> {
        let entry = self.ledger.get(session_id).await?;
        if !entry.was_revealed {
            return Ok(AggregationReport::new(
                *session_id,
                AggregationOutcome::NotRevealed,
            ));
        }

        let report = if self.ledger.claim_statistics(session_id).await? {
            self.fold(&entry).await
        } else if entry.is_completed() && self.ledger.claim_completion(session_id).await? {
            self.count_completion(&entry).await
        } else {
            tracing::debug!("Session '{}' already aggregated, skipping", session_id);
            return Ok(AggregationReport::new(
                *session_id,
                AggregationOutcome::AlreadyProcessed,
            ));
        };
        // The claim stays taken, so a failure here is not retried on its own.
        let report = report.inspect_err(|e| {
            tracing::error!(
                "Session '{}' was claimed but its statistics were not applied: {}",
                session_id,
                e
            );
        })?;
        if report.outcome == AggregationOutcome::AlreadyProcessed {
            return Ok(report);
        }

        if !report.is_complete() {
            tracing::warn!(
                "Session '{}' aggregated with {} failed user(s): {:?}",
                session_id,
                report.failures.len(),
                report.failures
            );
        }
        self.notify().await;
        Ok(report)
    }

    async fn fold(&self, entry: &SessionLedgerEntry) -> Result<AggregationReport, UseCaseError> {
        if self.stats.is_session_processed(&entry.id).await? {
            tracing::debug!("Session '{}' already in the global aggregate, skipping", entry.id);
            return Ok(AggregationReport::new(
                entry.id,
                AggregationOutcome::AlreadyProcessed,
            ));
        }

        let now = self.now();
        // Completed entries count their completion here, once.
        let count_completion =
            entry.is_completed() && self.ledger.claim_completion(&entry.id).await?;

        let mut report = AggregationReport::new(entry.id, AggregationOutcome::Folded);
        for (user_id, mut fold) in entry.user_folds() {
            fold.completed = count_completion;
            match self.stats.apply_user_fold(&user_id, &fold, now).await {
                Ok(()) => report.folded.push(user_id),
                Err(e) => report.failures.push(UserFoldFailure {
                    user_id,
                    reason: e.to_string(),
                }),
            }
        }

        let mut session_fold = entry.session_fold();
        session_fold.completed = count_completion;
        report.global_applied = self.stats.apply_session_fold(&session_fold, now).await?;
        if !report.global_applied {
            tracing::debug!("Session '{}' already in the global aggregate", entry.id);
        }

        self.refresh_user_counts(now).await?;
        tracing::info!(
            "Session '{}' folded into statistics ({} user(s))",
            entry.id,
            report.folded.len()
        );
        Ok(report)
    }

    async fn count_completion(
        &self,
        entry: &SessionLedgerEntry,
    ) -> Result<AggregationReport, UseCaseError> {
        let now = self.now();
        let mut report = AggregationReport::new(entry.id, AggregationOutcome::CompletionCounted);
        for user_id in entry.voters() {
            match self.stats.apply_user_completion(&user_id, now).await {
                Ok(()) => report.folded.push(user_id),
                Err(e) => report.failures.push(UserFoldFailure {
                    user_id,
                    reason: e.to_string(),
                }),
            }
        }
        self.stats.apply_global_completion(now).await?;
        report.global_applied = true;
        tracing::info!("Completion of session '{}' counted", entry.id);
        Ok(report)
    }

    /// Count one thrown reaction for both users and globally.
    ///
    /// Both ids must be stored ids; anything else is rejected before any
    /// counter moves.
    pub async fn record_reaction(
        &self,
        sender: &ParticipantRef,
        target: &ParticipantRef,
        symbol: &ReactionSymbol,
    ) -> Result<(), UseCaseError> {
        let sender_id = sender.stored()?;
        let target_id = target.stored()?;

        self.stats
            .record_reaction(&sender_id, &target_id, symbol, self.now())
            .await?;
        tracing::debug!(
            "Reaction '{}' from '{}' to '{}' counted",
            symbol.as_str(),
            sender_id,
            target_id
        );
        self.notify().await;
        Ok(())
    }

    pub async fn user_stats(&self, user_id: &UserId) -> Result<UserStatsAggregate, UseCaseError> {
        Ok(self.stats.user_stats(user_id).await?)
    }

    pub async fn global_stats(&self) -> Result<GlobalStatsAggregate, UseCaseError> {
        Ok(self.stats.global_stats().await?)
    }

    async fn refresh_user_counts(&self, now: Timestamp) -> Result<(), UseCaseError> {
        let total = self.users.count_users().await?;
        let since = Timestamp::new(days_before(now.value(), self.active_window_days));
        let active = self.users.count_active_since(since).await?;
        self.stats.set_user_counts(total, active, now).await?;
        Ok(())
    }

    async fn notify(&self) {
        if let Err(e) = self
            .message_pusher
            .broadcast_all(&OutboundEvent::StatsChanged)
            .await
        {
            tracing::warn!("Failed to push statsChanged: {}", e);
        }
    }
}
