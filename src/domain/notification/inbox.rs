//! Per-user notification inbox entries.
//!
//! An inbox entry is the durable twin of a live push: it survives
//! disconnection and guarantees at-least-once delivery to users who were
//! offline at publish time.

use serde::{Deserialize, Serialize};

use crate::domain::dispatch::EventKind;
use crate::domain::foundation::{InboxEntryId, IncidentId, Timestamp, UserId};

/// One notification in a user's inbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboxEntry {
    id: InboxEntryId,
    user_id: UserId,
    event_kind: EventKind,
    title: String,
    message: String,
    incident_id: Option<IncidentId>,
    is_read: bool,
    created_at: Timestamp,
}

impl InboxEntry {
    /// Creates a fresh unread entry.
    pub fn create(
        user_id: UserId,
        event_kind: EventKind,
        title: impl Into<String>,
        message: impl Into<String>,
        incident_id: Option<IncidentId>,
    ) -> Self {
        Self {
            id: InboxEntryId::new(),
            user_id,
            event_kind,
            title: title.into(),
            message: message.into(),
            incident_id,
            is_read: false,
            created_at: Timestamp::now(),
        }
    }

    /// Rehydrates an entry from storage.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: InboxEntryId,
        user_id: UserId,
        event_kind: EventKind,
        title: String,
        message: String,
        incident_id: Option<IncidentId>,
        is_read: bool,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            user_id,
            event_kind,
            title,
            message,
            incident_id,
            is_read,
            created_at,
        }
    }

    /// Marks the entry read. Idempotent.
    pub fn mark_read(&mut self) {
        self.is_read = true;
    }

    pub fn id(&self) -> InboxEntryId {
        self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn event_kind(&self) -> EventKind {
        self.event_kind
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn incident_id(&self) -> Option<IncidentId> {
        self.incident_id
    }

    pub fn is_read(&self) -> bool {
        self.is_read
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }
}
