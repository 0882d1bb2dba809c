//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! ## 原子性
//!
//! 読み取り → 変更 → 書き込みを呼び出し側で組み立てると、同時に走る
//! 2つの処理が同じ値を読んで片方の更新が失われます。そのため更新系の操作は
//! すべて「ストアの中で一度に適用される操作」として定義しています。

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{
    LedgerError, ReactionSymbol, RepositoryError, Room, RoomId, SessionId, Timestamp, UserId,
    entity::{
        GlobalStatsAggregate, Page, PageRequest, SessionFold, SessionLedgerEntry, UserSessionFold,
        UserStatsAggregate,
    },
};

/// Shared handle of one live room; the mutex is the per-room serialization point
pub type RoomHandle = Arc<Mutex<Room>>;

/// Mutation applied to a ledger entry under the store's lock
pub type EntryMutation =
    Box<dyn FnOnce(&mut SessionLedgerEntry) -> Result<(), LedgerError> + Send>;

/// Room Repository trait
///
/// ライブのルームを RoomId で管理します。ルームは初回アクセス時に作成されます。
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// ルームを取得（存在しなければ作成）
    async fn get_or_create(&self, room_id: &RoomId) -> RoomHandle;

    /// 既存のルームを取得
    async fn get(&self, room_id: &RoomId) -> Option<RoomHandle>;
}

/// Session Ledger Repository trait
#[async_trait]
pub trait SessionLedgerRepository: Send + Sync {
    async fn insert(&self, entry: SessionLedgerEntry) -> Result<(), RepositoryError>;

    async fn get(&self, id: &SessionId) -> Result<SessionLedgerEntry, RepositoryError>;

    /// Apply `mutation` atomically and return the updated entry.
    ///
    /// A rejected mutation leaves the stored entry untouched.
    async fn update(
        &self,
        id: &SessionId,
        mutation: EntryMutation,
    ) -> Result<SessionLedgerEntry, RepositoryError>;

    /// Test-and-set of `statistics_processed`. `true` means the caller won
    /// and must fold the entry.
    async fn claim_statistics(&self, id: &SessionId) -> Result<bool, RepositoryError>;

    /// Test-and-set of `completion_processed`.
    async fn claim_completion(&self, id: &SessionId) -> Result<bool, RepositoryError>;

    /// Entries the user created or took part in, newest first.
    async fn list_by_user(
        &self,
        user_id: &UserId,
        page: PageRequest,
    ) -> Result<Page<SessionLedgerEntry>, RepositoryError>;
}

/// Statistics Repository trait
///
/// すべての操作はストア内で原子的に適用されます。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatsRepository: Send + Sync {
    /// ユーザー集計に1セッション分を加算（集計がなければ作成）
    async fn apply_user_fold(
        &self,
        user_id: &UserId,
        fold: &UserSessionFold,
        now: Timestamp,
    ) -> Result<(), RepositoryError>;

    /// ユーザー集計の completedSessions を加算
    async fn apply_user_completion(
        &self,
        user_id: &UserId,
        now: Timestamp,
    ) -> Result<(), RepositoryError>;

    /// 全体集計への畳み込み。`processedSessionIds` に含まれていれば何もせず `false`
    async fn apply_session_fold(
        &self,
        fold: &SessionFold,
        now: Timestamp,
    ) -> Result<bool, RepositoryError>;

    /// `processedSessionIds` に登録済みかどうか
    async fn is_session_processed(&self, session_id: &SessionId) -> Result<bool, RepositoryError>;

    /// 全体集計の completedSessions を加算
    async fn apply_global_completion(&self, now: Timestamp) -> Result<(), RepositoryError>;

    /// 送信者・受信者・全体のリアクション集計を加算
    async fn record_reaction(
        &self,
        sender_id: &UserId,
        target_id: &UserId,
        symbol: &ReactionSymbol,
        now: Timestamp,
    ) -> Result<(), RepositoryError>;

    async fn set_user_counts(
        &self,
        total_users: u64,
        active_users: u64,
        now: Timestamp,
    ) -> Result<(), RepositoryError>;

    async fn user_stats(&self, user_id: &UserId) -> Result<UserStatsAggregate, RepositoryError>;

    async fn global_stats(&self) -> Result<GlobalStatsAggregate, RepositoryError>;
}

/// User directory collaborator
///
/// アカウント管理そのものは外部サービスの責務で、ここではアクティビティの
/// 記録と利用者数の取得だけを扱います。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn record_activity(&self, user_id: UserId, at: Timestamp)
    -> Result<(), RepositoryError>;

    async fn count_users(&self) -> Result<u64, RepositoryError>;

    /// Users with activity at or after `since`
    async fn count_active_since(&self, since: Timestamp) -> Result<u64, RepositoryError>;
}
