//! UseCase layer.
//!
//! ドメインモデルと Repository / MessagePusher を組み合わせて、
//! アプリケーションの操作を実装します。

pub mod error;
pub mod room_coordinator;
pub mod session_ledger;
pub mod statistics_aggregator;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::UseCaseError;
pub use room_coordinator::RoomCoordinator;
pub use session_ledger::SessionLedgerUseCase;
pub use statistics_aggregator::{
    AggregationOutcome, AggregationReport, DEFAULT_ACTIVE_WINDOW_DAYS, StatisticsAggregator,
    UserFoldFailure,
};
