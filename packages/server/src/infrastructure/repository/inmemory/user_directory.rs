//! InMemory User Directory 実装
//!
//! ユーザーごとの最終アクティビティ時刻だけを保持します。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{RepositoryError, Timestamp, UserDirectory, UserId};

#[derive(Default)]
pub struct InMemoryUserDirectory {
    last_seen: Mutex<HashMap<UserId, Timestamp>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn record_activity(
        &self,
        user_id: UserId,
        at: Timestamp,
    ) -> Result<(), RepositoryError> {
        let mut last_seen = self.last_seen.lock().await;
        let seen = last_seen.entry(user_id).or_insert(at);
        if at > *seen {
            *seen = at;
        }
        Ok(())
    }

    async fn count_users(&self) -> Result<u64, RepositoryError> {
        Ok(self.last_seen.lock().await.len() as u64)
    }

    async fn count_active_since(&self, since: Timestamp) -> Result<u64, RepositoryError> {
        let last_seen = self.last_seen.lock().await;
        Ok(last_seen.values().filter(|at| **at >= since).count() as u64)
    }
}
