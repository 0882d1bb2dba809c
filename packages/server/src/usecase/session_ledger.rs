//! UseCase: Session Ledger
//!
//! 1回の見積もりラウンドを永続的な台帳エントリとして記録します。
//! エントリへの変更はすべてストアの `update` を通して原子的に適用され、
//! 公開・完了・リアクションは Statistics Aggregator に引き渡されます。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - 作成・参加・投票・公開・完了の一連の流れ
//! - 完了済みエントリへの変更が Conflict になること
//! - 公開を繰り返しても集計が1回だけ行われること
//! - 履歴のページングと並び順

use std::sync::Arc;

use huddle_shared::time::Clock;

use crate::domain::{
    Completion, Page, PageRequest, ParticipantName, ParticipantRef, ReactionRecord,
    ReactionSymbol, SessionIdFactory, SessionLedgerEntry, SessionLedgerRepository, SessionId,
    SessionStatistics, SessionSummary, Timestamp, UserDirectory, UserId, VoteValue,
};

use super::{
    error::UseCaseError,
    statistics_aggregator::{AggregationReport, StatisticsAggregator},
};

/// 台帳操作のユースケース
pub struct SessionLedgerUseCase {
    ledger: Arc<dyn SessionLedgerRepository>,
    users: Arc<dyn UserDirectory>,
    aggregator: Arc<StatisticsAggregator>,
    clock: Arc<dyn Clock>,
}

impl SessionLedgerUseCase {
    pub fn new(
        ledger: Arc<dyn SessionLedgerRepository>,
        users: Arc<dyn UserDirectory>,
        aggregator: Arc<StatisticsAggregator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            ledger,
            users,
            aggregator,
            clock,
        }
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }

    pub async fn create_session(
        &self,
        created_by: UserId,
        title: Option<String>,
    ) -> Result<SessionLedgerEntry, UseCaseError> {
        let now = self.now();
        let entry = SessionLedgerEntry::new(SessionIdFactory::generate(), created_by, title, now);
        self.ledger.insert(entry.clone()).await?;
        self.users.record_activity(created_by, now).await?;
        tracing::info!("Session '{}' created by '{}'", entry.id, created_by);
        Ok(entry)
    }

    pub async fn add_participant(
        &self,
        session_id: &SessionId,
        user_id: UserId,
        username: ParticipantName,
    ) -> Result<SessionLedgerEntry, UseCaseError> {
        let entry = self
            .ledger
            .update(
                session_id,
                Box::new(move |entry: &mut SessionLedgerEntry| {
                    entry.add_participant(user_id).map(|_| ())
                }),
            )
            .await?;
        self.users.record_activity(user_id, self.now()).await?;
        tracing::debug!(
            "'{}' ({}) participates in session '{}'",
            username.as_str(),
            user_id,
            session_id
        );
        Ok(entry)
    }

    pub async fn add_vote(
        &self,
        session_id: &SessionId,
        user_id: UserId,
        username: ParticipantName,
        value: VoteValue,
    ) -> Result<SessionLedgerEntry, UseCaseError> {
        let now = self.now();
        let entry = self
            .ledger
            .update(
                session_id,
                Box::new(move |entry: &mut SessionLedgerEntry| {
                    entry.add_vote(user_id, username, value, now)
                }),
            )
            .await?;
        self.users.record_activity(user_id, now).await?;
        Ok(entry)
    }

    /// Reveal and hand the entry to the aggregator.
    ///
    /// Revealing again does not recompute anything; the aggregator sees the
    /// entry again and skips it.
    pub async fn reveal_votes(
        &self,
        session_id: &SessionId,
    ) -> Result<(SessionLedgerEntry, AggregationReport), UseCaseError> {
        let now = self.now();
        let entry = self
            .ledger
            .update(
                session_id,
                Box::new(move |entry: &mut SessionLedgerEntry| {
                    if entry.reveal(now) {
                        tracing::info!("Session '{}' revealed", entry.id);
                    }
                    Ok(())
                }),
            )
            .await?;
        let report = self.aggregator.process_session(session_id).await?;
        Ok((entry, report))
    }

    /// Complete the round, revealing it first when needed.
    pub async fn complete_session(
        &self,
        session_id: &SessionId,
    ) -> Result<(SessionLedgerEntry, AggregationReport), UseCaseError> {
        let now = self.now();
        let entry = self
            .ledger
            .update(
                session_id,
                Box::new(move |entry: &mut SessionLedgerEntry| {
                    match entry.complete(now) {
                        Completion::AlreadyCompleted => {
                            tracing::debug!("Session '{}' already completed", entry.id)
                        }
                        Completion::Completed { revealed_now } => tracing::info!(
                            "Session '{}' completed (revealed on completion: {})",
                            entry.id,
                            revealed_now
                        ),
                    }
                    Ok(())
                }),
            )
            .await?;
        let report = self.aggregator.process_session(session_id).await?;
        Ok((entry, report))
    }

    /// Append a reaction and count it in the statistics.
    ///
    /// Both participants must be identified by stored ids.
    pub async fn add_reaction(
        &self,
        session_id: &SessionId,
        sender: ParticipantRef,
        target: ParticipantRef,
        sender_name: ParticipantName,
        target_name: ParticipantName,
        symbol: ReactionSymbol,
    ) -> Result<SessionLedgerEntry, UseCaseError> {
        let sender_id = sender.stored()?;
        let target_id = target.stored()?;

        let record = ReactionRecord {
            sender_id,
            target_id,
            sender_name,
            target_name,
            symbol: symbol.clone(),
            thrown_at: self.now(),
        };
        let entry = self
            .ledger
            .update(
                session_id,
                Box::new(move |entry: &mut SessionLedgerEntry| {
                    entry.add_reaction(record);
                    Ok(())
                }),
            )
            .await?;
        self.aggregator
            .record_reaction(&sender, &target, &symbol)
            .await?;
        Ok(entry)
    }

    pub async fn get_session(
        &self,
        session_id: &SessionId,
    ) -> Result<SessionLedgerEntry, UseCaseError> {
        Ok(self.ledger.get(session_id).await?)
    }

    /// Sessions the user created or joined, newest first.
    pub async fn history(
        &self,
        user_id: &UserId,
        page: PageRequest,
    ) -> Result<Page<SessionSummary>, UseCaseError> {
        let page = self.ledger.list_by_user(user_id, page).await?;
        Ok(page.map(|entry| entry.summary()))
    }

    pub async fn statistics(
        &self,
        session_id: &SessionId,
    ) -> Result<SessionStatistics, UseCaseError> {
        let entry = self.ledger.get(session_id).await?;
        Ok(entry.statistics())
    }
}
