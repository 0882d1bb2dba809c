//! Domain entities.

pub mod agreement;
pub mod ledger;
pub mod room;
pub mod stats;

pub use agreement::{Agreement, AgreementLevel};
pub use ledger::{
    Completion, DEFAULT_SESSION_TITLE, Page, PageRequest, ReactionCount, ReactionRecord,
    SessionLedgerEntry, SessionStatistics, SessionStatus, SessionSummary, VoteBucket, VoteRecord,
};
pub use room::{JoinOutcome, Participant, Room, RoomState};
pub use stats::{
    GlobalReactionStats, GlobalStatsAggregate, ReactionStats, SessionFold, UserSessionFold,
    UserStatsAggregate, VotesStats,
};
