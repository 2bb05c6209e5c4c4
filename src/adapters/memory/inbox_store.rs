//! In-memory inbox store for tests and local development.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::foundation::{DispatchError, InboxEntryId, UserId};
use crate::domain::notification::InboxEntry;
use crate::ports::InboxStore;

/// [`InboxStore`] backed by a HashMap.
pub struct InMemoryInboxStore {
    entries: RwLock<HashMap<InboxEntryId, InboxEntry>>,
}

impl InMemoryInboxStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryInboxStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InboxStore for InMemoryInboxStore {
    async fn insert(&self, entry: &InboxEntry) -> Result<(), DispatchError> {
        self.entries
            .write()
            .expect("lock poisoned")
            .insert(entry.id(), entry.clone());
        Ok(())
    }

    async fn for_user(
        &self,
        user_id: &UserId,
        unread_only: bool,
    ) -> Result<Vec<InboxEntry>, DispatchError> {
        let mut matching: Vec<InboxEntry> = self
            .entries
            .read()
            .expect("lock poisoned")
            .values()
            .filter(|e| e.user_id() == user_id && (!unread_only || !e.is_read()))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(matching)
    }

    async fn mark_read(&self, entry_id: &InboxEntryId) -> Result<(), DispatchError> {
        if let Some(entry) = self
            .entries
            .write()
            .expect("lock poisoned")
            .get_mut(entry_id)
        {
            entry.mark_read();
        }
        Ok(())
    }

    async fn mark_all_read(&self, user_id: &UserId) -> Result<(), DispatchError> {
        for entry in self
            .entries
            .write()
            .expect("lock poisoned")
            .values_mut()
            .filter(|e| e.user_id() == user_id)
        {
            entry.mark_read();
        }
        Ok(())
    }

    async fn remove(&self, entry_id: &InboxEntryId) -> Result<(), DispatchError> {
        self.entries.write().expect("lock poisoned").remove(entry_id);
        Ok(())
    }

    async fn clear_all(&self, user_id: &UserId) -> Result<(), DispatchError> {
        self.entries
            .write()
            .expect("lock poisoned")
            .retain(|_, e| e.user_id() != user_id);
        Ok(())
    }
}
