//! Domain layer errors.

use thiserror::Error;

use super::value_object::SessionId;

/// Value object construction errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValueObjectError {
    #[error("client id must not be empty")]
    ClientIdEmpty,

    #[error("room id must not be empty")]
    RoomIdEmpty,

    #[error("participant name must not be empty")]
    NameEmpty,

    #[error("participant name is too long (max: {max}, actual: {actual})")]
    NameTooLong { max: usize, actual: usize },

    #[error("vote must be a finite, non-negative number (got {0})")]
    InvalidVote(String),

    #[error("reaction symbol must not be empty")]
    SymbolEmpty,

    #[error("reaction symbol is too long (max: {max}, actual: {actual})")]
    SymbolTooLong { max: usize, actual: usize },

    #[error("identifier '{0}' is not a stored identifier")]
    InvalidIdentifier(String),
}

/// Room state machine errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RoomError {
    #[error("participant '{0}' not found")]
    ParticipantNotFound(String),

    #[error("participant '{0}' is offline")]
    ParticipantOffline(String),

    #[error("a participant cannot throw a reaction at themselves")]
    SelfReaction,

    #[error("votes have not been revealed")]
    NotRevealed,
}

/// Session ledger entry errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("session '{0}' is already completed")]
    SessionCompleted(SessionId),
}

/// Data store errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("session '{0}' not found")]
    SessionNotFound(SessionId),

    #[error("session '{0}' already exists")]
    SessionAlreadyExists(SessionId),

    #[error("statistics for user '{0}' not found")]
    UserStatsNotFound(String),

    #[error(transparent)]
    Rejected(#[from] LedgerError),

    #[error("storage failure: {0}")]
    Storage(String),
}

/// MessagePusher errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MessagePushError {
    #[error("client '{0}' not found")]
    ClientNotFound(String),

    #[error("failed to push message: {0}")]
    PushFailed(String),

    #[error("failed to encode message: {0}")]
    EncodeFailed(String),
}
