//! UseCase layer errors.
//!
//! ドメイン層の各エラーを、呼び出し元（UI 層）が扱う5種類の分類に集約します。

use thiserror::Error;

use crate::domain::{LedgerError, RepositoryError, RoomError, ValueObjectError};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UseCaseError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage failure: {0}")]
    Storage(String),
}

impl UseCaseError {
    /// Stable machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "notFound",
            Self::InvalidArgument(_) => "invalidArgument",
            Self::InvalidIdentifier(_) => "invalidIdentifier",
            Self::Conflict(_) => "conflict",
            Self::Storage(_) => "storage",
        }
    }
}

impl From<ValueObjectError> for UseCaseError {
    fn from(error: ValueObjectError) -> Self {
        match error {
            ValueObjectError::InvalidIdentifier(raw) => Self::InvalidIdentifier(raw),
            other => Self::InvalidArgument(other.to_string()),
        }
    }
}

impl From<RoomError> for UseCaseError {
    fn from(error: RoomError) -> Self {
        match error {
            RoomError::ParticipantNotFound(_) => Self::NotFound(error.to_string()),
            RoomError::SelfReaction => Self::InvalidArgument(error.to_string()),
            RoomError::ParticipantOffline(_) | RoomError::NotRevealed => {
                Self::Conflict(error.to_string())
            }
        }
    }
}

impl From<LedgerError> for UseCaseError {
    fn from(error: LedgerError) -> Self {
        Self::Conflict(error.to_string())
    }
}

impl From<RepositoryError> for UseCaseError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::SessionNotFound(_) | RepositoryError::UserStatsNotFound(_) => {
                Self::NotFound(error.to_string())
            }
            RepositoryError::SessionAlreadyExists(_) => Self::Conflict(error.to_string()),
            RepositoryError::Rejected(inner) => inner.into(),
            RepositoryError::Storage(message) => Self::Storage(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SessionId;
    use uuid::Uuid;

    #[test]
    fn test_value_object_errors_are_classified() {
        // テスト項目: 識別子エラーは InvalidIdentifier、それ以外は InvalidArgument になる
        // given (前提条件):
        let identifier = ValueObjectError::InvalidIdentifier("guest".to_string());
        let name = ValueObjectError::NameEmpty;

        // when (操作):
        let identifier: UseCaseError = identifier.into();
        let name: UseCaseError = name.into();

        // then (期待する結果):
        assert_eq!(identifier, UseCaseError::InvalidIdentifier("guest".to_string()));
        assert_eq!(name.kind(), "invalidArgument");
    }

    #[test]
    fn test_rejected_mutation_is_conflict() {
        // テスト項目: ストアが拒否した変更（完了済みセッション）は Conflict になる
        // given (前提条件):
        let id = SessionId::from_uuid(Uuid::from_u128(1));
        let error = RepositoryError::Rejected(LedgerError::SessionCompleted(id));

        // when (操作):
        let error: UseCaseError = error.into();

        // then (期待する結果):
        assert_eq!(error.kind(), "conflict");
    }

    #[test]
    fn test_room_errors_are_classified() {
        // テスト項目: ルームのエラーがそれぞれの分類に変換される
        // given (前提条件) / when (操作) / then (期待する結果):
        assert_eq!(
            UseCaseError::from(RoomError::ParticipantNotFound("x".to_string())).kind(),
            "notFound"
        );
        assert_eq!(UseCaseError::from(RoomError::SelfReaction).kind(), "invalidArgument");
        assert_eq!(UseCaseError::from(RoomError::NotRevealed).kind(), "conflict");
    }
}
