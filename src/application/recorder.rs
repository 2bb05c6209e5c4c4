//! Durable notification recorder.
//!
//! The live fan-out reaches whoever is connected right now; the recorder
//! writes the same news into per-user inboxes so it survives
//! disconnection (at-least-once, read later). Recording is a side
//! channel: every failure in here is logged and swallowed, the domain
//! write that triggered the event is already committed and stays
//! committed.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::domain::dispatch::{
    BroadcastPayload, DispatchEvent, EventKind, IncidentCreatedPayload, ResourceAssignedPayload,
    UserNoticePayload,
};
use crate::domain::foundation::{DispatchError, InboxEntryId, IncidentId, UserId};
use crate::domain::notification::InboxEntry;
use crate::ports::{GroupDirectory, InboxStore};

/// Event kinds that produce inbox entries.
///
/// Status churn and roster updates are dashboard traffic; only events a
/// user should still see after being offline get recorded.
pub const RECORDED_EVENT_KINDS: &[EventKind] = &[
    EventKind::IncidentCreated,
    EventKind::ResourceAssigned,
    EventKind::RoleBroadcast,
    EventKind::GlobalBroadcast,
    EventKind::UserNotice,
];

/// Writes inbox entries for the users behind an event's target groups.
pub struct NotificationRecorder {
    directory: Arc<dyn GroupDirectory>,
    inbox: Arc<dyn InboxStore>,
}

impl NotificationRecorder {
    pub fn new(directory: Arc<dyn GroupDirectory>, inbox: Arc<dyn InboxStore>) -> Self {
        Self { directory, inbox }
    }

    /// Records an event into the inboxes of every user it targets.
    ///
    /// Infallible by contract: expansion or store failures are logged and
    /// the affected users simply miss this inbox entry.
    pub async fn record(&self, event: &DispatchEvent) {
        if !RECORDED_EVENT_KINDS.contains(&event.kind) {
            return;
        }

        let Some(content) = NotificationContent::from_event(event) else {
            tracing::warn!(
                event = %event.kind,
                event_id = %event.event_id,
                "undecodable payload, skipping inbox recording"
            );
            return;
        };

        let mut users: BTreeSet<UserId> = BTreeSet::new();
        for group in &event.targets {
            match self.directory.users_in(group).await {
                Ok(members) => users.extend(members),
                Err(e) => {
                    tracing::error!(
                        group = %group,
                        event_id = %event.event_id,
                        "group expansion failed, members of this group get no inbox entry: {}",
                        e
                    );
                }
            }
        }

        let mut recorded = 0usize;
        for user in &users {
            let entry = InboxEntry::create(
                user.clone(),
                event.kind,
                content.title.clone(),
                content.message.clone(),
                content.incident_id,
            );
            match self.inbox.insert(&entry).await {
                Ok(()) => recorded += 1,
                Err(e) => {
                    tracing::error!(
                        user_id = %user,
                        event_id = %event.event_id,
                        "inbox write failed: {}",
                        e
                    );
                }
            }
        }

        tracing::debug!(
            event = %event.kind,
            event_id = %event.event_id,
            users = users.len(),
            recorded,
            "inbox recording done"
        );
    }

    /// Lists a user's inbox, newest first.
    pub async fn inbox_for(
        &self,
        user_id: &UserId,
        unread_only: bool,
    ) -> Result<Vec<InboxEntry>, DispatchError> {
        self.inbox.for_user(user_id, unread_only).await
    }

    /// Marks one entry read. Unknown id is a no-op.
    pub async fn mark_read(&self, entry_id: &InboxEntryId) -> Result<(), DispatchError> {
        self.inbox.mark_read(entry_id).await
    }

    /// Marks all of a user's entries read.
    pub async fn mark_all_read(&self, user_id: &UserId) -> Result<(), DispatchError> {
        self.inbox.mark_all_read(user_id).await
    }

    /// Removes one entry. Unknown id is a no-op.
    pub async fn remove(&self, entry_id: &InboxEntryId) -> Result<(), DispatchError> {
        self.inbox.remove(entry_id).await
    }

    /// Removes all of a user's entries.
    pub async fn clear_all(&self, user_id: &UserId) -> Result<(), DispatchError> {
        self.inbox.clear_all(user_id).await
    }
}

/// Human-readable rendering of an event for inbox storage.
struct NotificationContent {
    title: String,
    message: String,
    incident_id: Option<IncidentId>,
}

impl NotificationContent {
    fn from_event(event: &DispatchEvent) -> Option<Self> {
        match event.kind {
            EventKind::IncidentCreated => {
                let payload: IncidentCreatedPayload = event.payload_as().ok()?;
                Some(Self {
                    title: "New incident".to_string(),
                    message: payload.description,
                    incident_id: Some(payload.incident_id),
                })
            }
            EventKind::ResourceAssigned => {
                let payload: ResourceAssignedPayload = event.payload_as().ok()?;
                Some(Self {
                    title: "Resource assigned".to_string(),
                    message: format!(
                        "{} {} assigned by {}",
                        payload.resource_type, payload.resource_id, payload.assigned_by
                    ),
                    incident_id: Some(payload.incident_id),
                })
            }
            EventKind::RoleBroadcast | EventKind::GlobalBroadcast => {
                let payload: BroadcastPayload = event.payload_as().ok()?;
                Some(Self {
                    title: payload.title,
                    message: payload.message,
                    incident_id: None,
                })
            }
            EventKind::UserNotice => {
                let payload: UserNoticePayload = event.payload_as().ok()?;
                Some(Self {
                    title: payload.title,
                    message: payload.message,
                    incident_id: payload.incident_id,
                })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryGroupDirectory, InMemoryInboxStore};
    use crate::domain::foundation::StationId;
    use crate::domain::routing::{EventScope, GroupKey};
    use serde_json::json;

    fn recorder_with(
        directory: Arc<InMemoryGroupDirectory>,
        inbox: Arc<InMemoryInboxStore>,
    ) -> NotificationRecorder {
        NotificationRecorder::new(directory, inbox)
    }

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    #[tokio::test]
    async fn broadcast_is_recorded_for_every_group_member() {
        let directory = Arc::new(InMemoryGroupDirectory::new());
        directory.add_member(GroupKey::Global, user("u-1"));
        directory.add_member(GroupKey::Global, user("u-2"));
        let inbox = Arc::new(InMemoryInboxStore::new());
        let recorder = recorder_with(directory, inbox.clone());

        let event = DispatchEvent::new(
            EventKind::GlobalBroadcast,
            &EventScope::global(),
            json!({"title": "Drill", "message": "Radio check"}),
        );
        recorder.record(&event).await;

        assert_eq!(inbox.len(), 2);
        let listed = recorder.inbox_for(&user("u-1"), true).await.unwrap();
        assert_eq!(listed[0].title(), "Drill");
    }

    #[tokio::test]
    async fn user_appearing_in_two_groups_gets_one_entry() {
        let directory = Arc::new(InMemoryGroupDirectory::new());
        let station = GroupKey::Station(StationId::new(7).unwrap());
        directory.add_member(station, user("u-1"));
        let inbox = Arc::new(InMemoryInboxStore::new());
        let recorder = recorder_with(directory, inbox.clone());

        // Incident created routes to the station; also notify the same
        // user directly and confirm each event records once.
        let scope = EventScope::incident(StationId::from_raw(7), None);
        let event = DispatchEvent::from_payload(
            EventKind::IncidentCreated,
            &scope,
            &IncidentCreatedPayload {
                incident_id: IncidentId::new(),
                station_id: StationId::from_raw(7),
                agency_id: None,
                description: "barn fire".to_string(),
                status: crate::domain::dispatch::IncidentStatus::Open,
                created_at: crate::domain::foundation::Timestamp::now(),
            },
        );
        recorder.record(&event).await;

        assert_eq!(inbox.len(), 1);
    }

    #[tokio::test]
    async fn status_churn_is_not_recorded() {
        let directory = Arc::new(InMemoryGroupDirectory::new());
        directory.add_member(GroupKey::Station(StationId::new(7).unwrap()), user("u-1"));
        let inbox = Arc::new(InMemoryInboxStore::new());
        let recorder = recorder_with(directory, inbox.clone());

        let event = DispatchEvent::new(
            EventKind::AssignmentStatusChanged,
            &EventScope::incident(StationId::from_raw(7), None),
            json!({}),
        );
        recorder.record(&event).await;

        assert!(inbox.is_empty());
    }

    #[tokio::test]
    async fn undecodable_payload_is_skipped_not_fatal() {
        let directory = Arc::new(InMemoryGroupDirectory::new());
        directory.add_member(GroupKey::Global, user("u-1"));
        let inbox = Arc::new(InMemoryInboxStore::new());
        let recorder = recorder_with(directory, inbox.clone());

        let event = DispatchEvent::new(
            EventKind::GlobalBroadcast,
            &EventScope::global(),
            json!({"unexpected": true}),
        );
        recorder.record(&event).await;

        assert!(inbox.is_empty());
    }

    #[tokio::test]
    async fn user_notice_lands_in_exactly_that_inbox() {
        let directory = Arc::new(InMemoryGroupDirectory::new());
        let inbox = Arc::new(InMemoryInboxStore::new());
        let recorder = recorder_with(directory, inbox.clone());

        let event = DispatchEvent::from_payload(
            EventKind::UserNotice,
            &EventScope::user(user("u-9")),
            &UserNoticePayload {
                title: "Assigned".to_string(),
                message: "You are due on scene".to_string(),
                incident_id: None,
            },
        );
        recorder.record(&event).await;

        assert_eq!(recorder.inbox_for(&user("u-9"), true).await.unwrap().len(), 1);
        assert!(recorder.inbox_for(&user("u-1"), true).await.unwrap().is_empty());
    }
}
