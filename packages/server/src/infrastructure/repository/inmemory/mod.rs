//! InMemory 実装
//!
//! プロセス内の HashMap をストアとして使用します。各ストアは tokio の Mutex を
//! 1つ持ち、更新系の操作はそのロックの中で完結させます。

pub mod ledger;
pub mod room;
pub mod stats;
pub mod user_directory;

pub use ledger::InMemorySessionLedgerRepository;
pub use room::InMemoryRoomRepository;
pub use stats::InMemoryStatsRepository;
pub use user_directory::InMemoryUserDirectory;
