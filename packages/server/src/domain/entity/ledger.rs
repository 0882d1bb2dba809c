//! Session ledger entry: the durable record of one voting round.
//!
//! The ledger has its own lifecycle, independent of the live room:
//! `active → revealed → completed`, never backwards.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::agreement::{Agreement, ledger_agreement, rounded_average};
use crate::domain::{
    LedgerError, ParticipantName, ReactionSymbol, SessionId, Timestamp, UserId, VoteValue,
};

/// Title used when the creator does not give one
pub const DEFAULT_SESSION_TITLE: &str = "Untitled session";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Revealed,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRecord {
    pub user_id: UserId,
    pub username: ParticipantName,
    pub initial_vote: VoteValue,
    pub final_vote: VoteValue,
    pub voted_at: Timestamp,
    pub changed_after_reveal: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionRecord {
    pub sender_id: UserId,
    pub target_id: UserId,
    pub sender_name: ParticipantName,
    pub target_name: ParticipantName,
    pub symbol: ReactionSymbol,
    pub thrown_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionLedgerEntry {
    pub id: SessionId,
    pub created_by: UserId,
    pub title: String,
    pub status: SessionStatus,
    pub participant_ids: BTreeSet<UserId>,
    pub votes: Vec<VoteRecord>,
    pub reactions: Vec<ReactionRecord>,
    pub was_revealed: bool,
    pub average_vote: Option<f64>,
    pub agreement: Option<Agreement>,
    /// Per-entry idempotency guard of the statistics fold
    pub statistics_processed: bool,
    /// Guard for the completion counters
    pub completion_processed: bool,
    pub created_at: Timestamp,
    pub revealed_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
}

/// What `complete` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    AlreadyCompleted,
    /// `revealed_now` is set when the reveal transition ran as part of completion
    Completed { revealed_now: bool },
}

impl SessionLedgerEntry {
    pub fn new(id: SessionId, created_by: UserId, title: Option<String>, now: Timestamp) -> Self {
        let title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_SESSION_TITLE.to_string());
        Self {
            id,
            created_by,
            title,
            status: SessionStatus::Active,
            participant_ids: BTreeSet::from([created_by]),
            votes: Vec::new(),
            reactions: Vec::new(),
            was_revealed: false,
            average_vote: None,
            agreement: None,
            statistics_processed: false,
            completion_processed: false,
            created_at: now,
            revealed_at: None,
            completed_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == SessionStatus::Completed
    }

    fn ensure_open(&self) -> Result<(), LedgerError> {
        if self.is_completed() {
            return Err(LedgerError::SessionCompleted(self.id));
        }
        Ok(())
    }

    /// Set-insert. Returns whether the user was new.
    pub fn add_participant(&mut self, user_id: UserId) -> Result<bool, LedgerError> {
        self.ensure_open()?;
        Ok(self.participant_ids.insert(user_id))
    }

    pub fn add_vote(
        &mut self,
        user_id: UserId,
        username: ParticipantName,
        value: VoteValue,
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        self.ensure_open()?;
        self.participant_ids.insert(user_id);

        let was_revealed = self.was_revealed;
        match self.votes.iter_mut().find(|r| r.user_id == user_id) {
            None => self.votes.push(VoteRecord {
                user_id,
                username,
                initial_vote: value,
                final_vote: value,
                voted_at: now,
                changed_after_reveal: false,
            }),
            Some(record) if !was_revealed => {
                record.username = username;
                record.initial_vote = value;
                record.final_vote = value;
                record.voted_at = now;
            }
            Some(record) => {
                if record.final_vote != value {
                    record.final_vote = value;
                    record.changed_after_reveal = true;
                }
            }
        }
        Ok(())
    }

    /// Reveal transition. Returns `false` when the entry was already past it.
    ///
    /// Average and agreement are computed from `initial_vote` only.
    pub fn reveal(&mut self, now: Timestamp) -> bool {
        if self.status != SessionStatus::Active {
            return false;
        }
        let initial_votes: Vec<f64> = self.votes.iter().map(|r| r.initial_vote.value()).collect();
        self.status = SessionStatus::Revealed;
        self.was_revealed = true;
        self.revealed_at = Some(now);
        self.average_vote = rounded_average(&initial_votes);
        self.agreement = ledger_agreement(&initial_votes).map(Agreement::from);
        true
    }

    pub fn complete(&mut self, now: Timestamp) -> Completion {
        if self.is_completed() {
            return Completion::AlreadyCompleted;
        }
        let revealed_now = self.reveal(now);
        self.status = SessionStatus::Completed;
        self.completed_at = Some(now);
        Completion::Completed { revealed_now }
    }

    pub fn add_reaction(&mut self, record: ReactionRecord) {
        self.reactions.push(record);
    }

    /// Whether the user created or took part in this round.
    pub fn involves(&self, user_id: &UserId) -> bool {
        &self.created_by == user_id || self.participant_ids.contains(user_id)
    }

    /// Distinct voters in first-vote order.
    pub fn voters(&self) -> Vec<UserId> {
        let mut seen = BTreeSet::new();
        self.votes
            .iter()
            .filter(|r| seen.insert(r.user_id))
            .map(|r| r.user_id)
            .collect()
    }

    pub fn changed_vote_count(&self) -> u64 {
        self.votes.iter().filter(|r| r.changed_after_reveal).count() as u64
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id,
            title: self.title.clone(),
            status: self.status,
            created_by: self.created_by,
            participant_count: self.participant_ids.len(),
            vote_count: self.votes.len(),
            average_vote: self.average_vote,
            agreement: self.agreement.clone(),
            created_at: self.created_at,
            revealed_at: self.revealed_at,
            completed_at: self.completed_at,
        }
    }

    /// Statistics view of this round.
    ///
    /// Vote buckets use the current (`final_vote`) answers, ascending by
    /// value. Reaction buckets are sorted by count descending, then symbol.
    pub fn statistics(&self) -> SessionStatistics {
        let mut vote_counts: BTreeMap<String, (f64, u64)> = BTreeMap::new();
        for record in &self.votes {
            let entry = vote_counts
                .entry(record.final_vote.histogram_key())
                .or_insert((record.final_vote.value(), 0));
            entry.1 += 1;
        }
        let mut vote_distribution: Vec<VoteBucket> = vote_counts
            .into_values()
            .map(|(value, count)| VoteBucket { value, count })
            .collect();
        vote_distribution.sort_by(|a, b| a.value.total_cmp(&b.value));

        let mut reaction_counts: BTreeMap<&ReactionSymbol, u64> = BTreeMap::new();
        for reaction in &self.reactions {
            *reaction_counts.entry(&reaction.symbol).or_insert(0) += 1;
        }
        let mut reaction_distribution: Vec<ReactionCount> = reaction_counts
            .into_iter()
            .map(|(symbol, count)| ReactionCount {
                symbol: symbol.clone(),
                count,
            })
            .collect();
        reaction_distribution.sort_by(|a, b| b.count.cmp(&a.count).then(a.symbol.cmp(&b.symbol)));

        SessionStatistics {
            session_id: self.id,
            title: self.title.clone(),
            status: self.status,
            participant_count: self.participant_ids.len(),
            vote_count: self.votes.len(),
            changed_after_reveal_count: self.changed_vote_count(),
            reaction_count: self.reactions.len(),
            average_vote: self.average_vote,
            agreement: self.agreement.clone(),
            vote_distribution,
            reaction_distribution,
        }
    }
}

/// One row of a user's session history.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: SessionId,
    pub title: String,
    pub status: SessionStatus,
    pub created_by: UserId,
    pub participant_count: usize,
    pub vote_count: usize,
    pub average_vote: Option<f64>,
    pub agreement: Option<Agreement>,
    pub created_at: Timestamp,
    pub revealed_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoteBucket {
    pub value: f64,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReactionCount {
    pub symbol: ReactionSymbol,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatistics {
    pub session_id: SessionId,
    pub title: String,
    pub status: SessionStatus,
    pub participant_count: usize,
    pub vote_count: usize,
    pub changed_after_reveal_count: u64,
    pub reaction_count: usize,
    pub average_vote: Option<f64>,
    pub agreement: Option<Agreement>,
    pub vote_distribution: Vec<VoteBucket>,
    pub reaction_distribution: Vec<ReactionCount>,
}

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub limit: usize,
}

impl PageRequest {
    pub const DEFAULT_LIMIT: usize = 10;
    pub const MAX_LIMIT: usize = 100;

    /// Missing values fall back to page 1 and the default limit; the limit
    /// is clamped to `1..=MAX_LIMIT`.
    pub fn new(page: Option<usize>, limit: Option<usize>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub limit: usize,
    pub total: usize,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total: self.total,
        }
    }
}
