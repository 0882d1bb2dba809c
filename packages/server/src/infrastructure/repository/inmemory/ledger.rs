//! InMemory Session Ledger Repository 実装
//!
//! ## 技術的負債
//!
//! ドメインモデル（`SessionLedgerEntry`）をそのまま保存しています。
//! 永続化ストアを実装する際は Row ↔ エントリの変換層が必要になります。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    EntryMutation, Page, PageRequest, RepositoryError, SessionId, SessionLedgerEntry,
    SessionLedgerRepository, UserId,
};

/// インメモリ Session Ledger Repository 実装
#[derive(Default)]
pub struct InMemorySessionLedgerRepository {
    entries: Mutex<HashMap<SessionId, SessionLedgerEntry>>,
}

impl InMemorySessionLedgerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn test_and_set(
        &self,
        id: &SessionId,
        flag: fn(&mut SessionLedgerEntry) -> &mut bool,
    ) -> Result<bool, RepositoryError> {
        let mut entries = self.entries.lock().await;
        let entry = entries
            .get_mut(id)
            .ok_or(RepositoryError::SessionNotFound(*id))?;
        let flag = flag(entry);
        if *flag {
            return Ok(false);
        }
        *flag = true;
        Ok(true)
    }
}

#[async_trait]
impl SessionLedgerRepository for InMemorySessionLedgerRepository {
    async fn insert(&self, entry: SessionLedgerEntry) -> Result<(), RepositoryError> {
        let mut entries = self.entries.lock().await;
        if entries.contains_key(&entry.id) {
            return Err(RepositoryError::SessionAlreadyExists(entry.id));
        }
        entries.insert(entry.id, entry);
        Ok(())
    }

    async fn get(&self, id: &SessionId) -> Result<SessionLedgerEntry, RepositoryError> {
        let entries = self.entries.lock().await;
        entries
            .get(id)
            .cloned()
            .ok_or(RepositoryError::SessionNotFound(*id))
    }

    async fn update(
        &self,
        id: &SessionId,
        mutation: EntryMutation,
    ) -> Result<SessionLedgerEntry, RepositoryError> {
        let mut entries = self.entries.lock().await;
        let stored = entries
            .get_mut(id)
            .ok_or(RepositoryError::SessionNotFound(*id))?;

        // Work on a copy so a rejected mutation leaves no partial change.
        let mut updated = stored.clone();
        mutation(&mut updated)?;
        *stored = updated.clone();
        Ok(updated)
    }

    async fn claim_statistics(&self, id: &SessionId) -> Result<bool, RepositoryError> {
        self.test_and_set(id, |entry| &mut entry.statistics_processed)
            .await
    }

    async fn claim_completion(&self, id: &SessionId) -> Result<bool, RepositoryError> {
        self.test_and_set(id, |entry| &mut entry.completion_processed)
            .await
    }

    async fn list_by_user(
        &self,
        user_id: &UserId,
        page: PageRequest,
    ) -> Result<Page<SessionLedgerEntry>, RepositoryError> {
        let entries = self.entries.lock().await;
        let mut matching: Vec<&SessionLedgerEntry> = entries
            .values()
            .filter(|entry| entry.involves(user_id))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len();
        let items = matching
            .into_iter()
            .skip(page.offset())
            .take(page.limit)
            .cloned()
            .collect();
        Ok(Page {
            items,
            page: page.page,
            limit: page.limit,
            total,
        })
    }
}
