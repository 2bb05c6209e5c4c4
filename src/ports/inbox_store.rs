//! Notification inbox store port.
//!
//! Mutations are idempotent; "not found" is a silent no-op everywhere.
//! The only error condition is the store itself failing.

use async_trait::async_trait;

use crate::domain::foundation::{DispatchError, InboxEntryId, UserId};
use crate::domain::notification::InboxEntry;

/// Port for per-user notification inbox persistence.
#[async_trait]
pub trait InboxStore: Send + Sync {
    /// Inserts a new inbox entry.
    ///
    /// # Errors
    ///
    /// - `Database` on persistence failure
    async fn insert(&self, entry: &InboxEntry) -> Result<(), DispatchError>;

    /// Lists a user's entries, newest first.
    async fn for_user(
        &self,
        user_id: &UserId,
        unread_only: bool,
    ) -> Result<Vec<InboxEntry>, DispatchError>;

    /// Marks one entry read. Unknown id is a no-op.
    async fn mark_read(&self, entry_id: &InboxEntryId) -> Result<(), DispatchError>;

    /// Marks all of a user's entries read.
    async fn mark_all_read(&self, user_id: &UserId) -> Result<(), DispatchError>;

    /// Removes one entry. Unknown id is a no-op.
    async fn remove(&self, entry_id: &InboxEntryId) -> Result<(), DispatchError>;

    /// Removes all of a user's entries.
    async fn clear_all(&self, user_id: &UserId) -> Result<(), DispatchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbox_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn InboxStore) {}
    }
}
