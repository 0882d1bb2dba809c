//! Durable statistics rollups.
//!
//! `UserSessionFold` / `SessionFold` are the increments derived from one
//! ledger entry; the aggregates only know how to apply them. Idempotency is
//! handled by the caller (per-entry flag) and by `GlobalStatsAggregate`
//! itself (`processed_session_ids`).

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::agreement::round_to;
use super::ledger::{ReactionCount, SessionLedgerEntry, SessionStatus};
use crate::domain::{ReactionSymbol, SessionId, Timestamp, UserId};

/// Size of the global reaction leaderboard
pub const TOP_REACTIONS_LIMIT: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VotesStats {
    pub total: u64,
    /// Histogram keyed by `VoteValue::histogram_key`
    pub value_histogram: BTreeMap<String, u64>,
    pub changed_after_reveal: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReactionStats {
    pub sent: BTreeMap<ReactionSymbol, u64>,
    pub received: BTreeMap<ReactionSymbol, u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatsAggregate {
    pub user_id: UserId,
    pub total_sessions: u64,
    pub completed_sessions: u64,
    pub votes_stats: VotesStats,
    pub reaction_stats: ReactionStats,
    pub last_updated: Timestamp,
}

impl UserStatsAggregate {
    pub fn new(user_id: UserId, now: Timestamp) -> Self {
        Self {
            user_id,
            total_sessions: 0,
            completed_sessions: 0,
            votes_stats: VotesStats::default(),
            reaction_stats: ReactionStats::default(),
            last_updated: now,
        }
    }

    pub fn apply_session(&mut self, fold: &UserSessionFold, now: Timestamp) {
        self.total_sessions += 1;
        if fold.completed {
            self.completed_sessions += 1;
        }
        self.votes_stats.total += 1;
        if fold.changed_after_reveal {
            self.votes_stats.changed_after_reveal += 1;
        }
        *self
            .votes_stats
            .value_histogram
            .entry(fold.initial_vote_key.clone())
            .or_insert(0) += 1;
        self.last_updated = now;
    }

    pub fn apply_completion(&mut self, now: Timestamp) {
        self.completed_sessions += 1;
        self.last_updated = now;
    }

    pub fn record_sent(&mut self, symbol: &ReactionSymbol, now: Timestamp) {
        *self.reaction_stats.sent.entry(symbol.clone()).or_insert(0) += 1;
        self.last_updated = now;
    }

    pub fn record_received(&mut self, symbol: &ReactionSymbol, now: Timestamp) {
        *self
            .reaction_stats
            .received
            .entry(symbol.clone())
            .or_insert(0) += 1;
        self.last_updated = now;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalReactionStats {
    pub total: u64,
    #[serde(skip)]
    counts: BTreeMap<ReactionSymbol, u64>,
    pub top_reactions: Vec<ReactionCount>,
}

impl GlobalReactionStats {
    fn record(&mut self, symbol: &ReactionSymbol) {
        self.total += 1;
        *self.counts.entry(symbol.clone()).or_insert(0) += 1;

        let mut ranking: Vec<ReactionCount> = self
            .counts
            .iter()
            .map(|(symbol, count)| ReactionCount {
                symbol: symbol.clone(),
                count: *count,
            })
            .collect();
        ranking.sort_by(|a, b| b.count.cmp(&a.count).then(a.symbol.cmp(&b.symbol)));
        ranking.truncate(TOP_REACTIONS_LIMIT);
        self.top_reactions = ranking;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStatsAggregate {
    pub total_sessions: u64,
    pub completed_sessions: u64,
    pub votes_stats: VotesStats,
    pub reaction_stats: GlobalReactionStats,
    pub total_users: u64,
    pub active_users: u64,
    /// Votes per folded session, two decimals
    pub average_per_session: f64,
    pub processed_session_ids: BTreeSet<SessionId>,
    pub last_updated: Timestamp,
}

impl GlobalStatsAggregate {
    pub fn new(now: Timestamp) -> Self {
        Self {
            total_sessions: 0,
            completed_sessions: 0,
            votes_stats: VotesStats::default(),
            reaction_stats: GlobalReactionStats::default(),
            total_users: 0,
            active_users: 0,
            average_per_session: 0.0,
            processed_session_ids: BTreeSet::new(),
            last_updated: now,
        }
    }

    pub fn is_processed(&self, session_id: &SessionId) -> bool {
        self.processed_session_ids.contains(session_id)
    }

    /// Fold one session in. Returns `false` (and changes nothing) when the
    /// session was already folded.
    pub fn apply_session(&mut self, fold: &SessionFold, now: Timestamp) -> bool {
        if !self.processed_session_ids.insert(fold.session_id) {
            return false;
        }
        self.total_sessions += 1;
        if fold.completed {
            self.completed_sessions += 1;
        }
        self.votes_stats.total += fold.vote_count;
        self.votes_stats.changed_after_reveal += fold.changed_count;
        for (key, count) in &fold.histogram {
            *self
                .votes_stats
                .value_histogram
                .entry(key.clone())
                .or_insert(0) += count;
        }
        self.average_per_session = round_to(
            self.votes_stats.total as f64 / self.total_sessions as f64,
            2,
        );
        self.last_updated = now;
        true
    }

    pub fn apply_completion(&mut self, now: Timestamp) {
        self.completed_sessions += 1;
        self.last_updated = now;
    }

    pub fn record_reaction(&mut self, symbol: &ReactionSymbol, now: Timestamp) {
        self.reaction_stats.record(symbol);
        self.last_updated = now;
    }

    pub fn set_user_counts(&mut self, total_users: u64, active_users: u64, now: Timestamp) {
        self.total_users = total_users;
        self.active_users = active_users;
        self.last_updated = now;
    }
}

/// Increments one voter gets from one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSessionFold {
    pub session_id: SessionId,
    pub completed: bool,
    pub changed_after_reveal: bool,
    pub initial_vote_key: String,
}

/// Increments the global aggregate gets from one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFold {
    pub session_id: SessionId,
    pub completed: bool,
    pub vote_count: u64,
    pub changed_count: u64,
    pub histogram: BTreeMap<String, u64>,
}

impl SessionLedgerEntry {
    /// One fold per distinct voter, keyed by the first record of that voter.
    pub fn user_folds(&self) -> Vec<(UserId, UserSessionFold)> {
        let completed = self.status == SessionStatus::Completed;
        let mut seen = BTreeSet::new();
        self.votes
            .iter()
            .filter(|record| seen.insert(record.user_id))
            .map(|record| {
                (
                    record.user_id,
                    UserSessionFold {
                        session_id: self.id,
                        completed,
                        changed_after_reveal: record.changed_after_reveal,
                        initial_vote_key: record.initial_vote.histogram_key(),
                    },
                )
            })
            .collect()
    }

    pub fn session_fold(&self) -> SessionFold {
        let mut histogram = BTreeMap::new();
        for record in &self.votes {
            *histogram
                .entry(record.initial_vote.histogram_key())
                .or_insert(0) += 1;
        }
        SessionFold {
            session_id: self.id,
            completed: self.status == SessionStatus::Completed,
            vote_count: self.votes.len() as u64,
            changed_count: self.changed_vote_count(),
            histogram,
        }
    }
}
