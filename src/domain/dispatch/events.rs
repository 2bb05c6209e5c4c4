//! Domain events: the unit of fan-out.
//!
//! A [`DispatchEvent`] is immutable once constructed. Its target groups
//! are computed exactly once, at construction, from the event's domain
//! fields — never recomputed per connection.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeSet;
use std::fmt;

use crate::domain::foundation::{
    AgencyId, AssignmentId, EventId, IncidentId, StationId, Timestamp, UserId,
};
use crate::domain::routing::{resolve_targets, EventScope, GroupKey};

use super::assignment::AssignmentStatus;
use super::incident::IncidentStatus;
use super::resource::ResourceType;

/// Kind of domain event carried by the fan-out layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "incident.created")]
    IncidentCreated,
    #[serde(rename = "incident.status_changed")]
    IncidentStatusChanged,
    #[serde(rename = "resource.assigned")]
    ResourceAssigned,
    #[serde(rename = "assignment.status_changed")]
    AssignmentStatusChanged,
    #[serde(rename = "incident.log_added")]
    IncidentLogAdded,
    #[serde(rename = "personnel.created")]
    PersonnelCreated,
    #[serde(rename = "personnel.updated")]
    PersonnelUpdated,
    #[serde(rename = "personnel.deleted")]
    PersonnelDeleted,
    #[serde(rename = "vehicle.created")]
    VehicleCreated,
    #[serde(rename = "vehicle.updated")]
    VehicleUpdated,
    #[serde(rename = "vehicle.deleted")]
    VehicleDeleted,
    #[serde(rename = "broadcast.role")]
    RoleBroadcast,
    #[serde(rename = "broadcast.global")]
    GlobalBroadcast,
    #[serde(rename = "user.notice")]
    UserNotice,
}

impl EventKind {
    /// Wire name of the event type.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::IncidentCreated => "incident.created",
            EventKind::IncidentStatusChanged => "incident.status_changed",
            EventKind::ResourceAssigned => "resource.assigned",
            EventKind::AssignmentStatusChanged => "assignment.status_changed",
            EventKind::IncidentLogAdded => "incident.log_added",
            EventKind::PersonnelCreated => "personnel.created",
            EventKind::PersonnelUpdated => "personnel.updated",
            EventKind::PersonnelDeleted => "personnel.deleted",
            EventKind::VehicleCreated => "vehicle.created",
            EventKind::VehicleUpdated => "vehicle.updated",
            EventKind::VehicleDeleted => "vehicle.deleted",
            EventKind::RoleBroadcast => "broadcast.role",
            EventKind::GlobalBroadcast => "broadcast.global",
            EventKind::UserNotice => "user.notice",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable domain event, ready for fan-out and inbox recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchEvent {
    /// Unique ID for this event instance (client-side deduplication).
    pub event_id: EventId,

    /// Event kind, used for routing and client dispatch.
    pub kind: EventKind,

    /// Event-specific payload as JSON.
    pub payload: JsonValue,

    /// Groups this event must reach; computed once at construction.
    pub targets: BTreeSet<GroupKey>,

    /// When the event occurred (server clock).
    pub occurred_at: Timestamp,
}

impl DispatchEvent {
    /// Constructs an event and resolves its target groups from the scope.
    pub fn new(kind: EventKind, scope: &EventScope, payload: JsonValue) -> Self {
        Self {
            event_id: EventId::new(),
            kind,
            payload,
            targets: resolve_targets(kind, scope),
            occurred_at: Timestamp::now(),
        }
    }

    /// Constructs an event from a typed payload.
    pub fn from_payload<T: Serialize>(kind: EventKind, scope: &EventScope, payload: &T) -> Self {
        Self::new(
            kind,
            scope,
            serde_json::to_value(payload)
                .expect("event payload serialization should never fail for well-formed payloads"),
        )
    }

    /// Deserializes the payload into a typed struct.
    pub fn payload_as<T: for<'de> Deserialize<'de>>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}

// ============================================
// Typed payloads (shared by service, wire and reconciler)
// ============================================

/// Payload for `incident.created`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentCreatedPayload {
    pub incident_id: IncidentId,
    pub station_id: Option<StationId>,
    pub agency_id: Option<AgencyId>,
    pub description: String,
    pub status: IncidentStatus,
    pub created_at: Timestamp,
}

/// Payload for `incident.status_changed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentStatusChangedPayload {
    pub incident_id: IncidentId,
    pub old_status: IncidentStatus,
    pub new_status: IncidentStatus,
}

/// Payload for `resource.assigned`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceAssignedPayload {
    pub incident_id: IncidentId,
    pub assignment_id: AssignmentId,
    pub resource_type: ResourceType,
    pub resource_id: i64,
    pub status: AssignmentStatus,
    pub assigned_by: UserId,
}

/// Payload for `assignment.status_changed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentStatusChangedPayload {
    pub incident_id: IncidentId,
    pub assignment_id: AssignmentId,
    pub old_status: AssignmentStatus,
    pub new_status: AssignmentStatus,
    pub changed_by: UserId,
}

/// Payload for `incident.log_added`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentLogAddedPayload {
    pub incident_id: IncidentId,
    pub message: String,
    pub logged_by: UserId,
}

/// Payload for roster/fleet change events (`personnel.*`, `vehicle.*`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterChangePayload {
    pub resource_type: ResourceType,
    pub resource_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Payload for role and global broadcasts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastPayload {
    pub title: String,
    pub message: String,
}

/// Payload for a direct user notice (e.g. "you were assigned").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserNoticePayload {
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident_id: Option<IncidentId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_resolves_targets_once_at_construction() {
        let scope = EventScope::incident(StationId::from_raw(7), AgencyId::from_raw(3));
        let event = DispatchEvent::new(EventKind::AssignmentStatusChanged, &scope, json!({}));

        assert_eq!(event.targets.len(), 2);
        assert!(event
            .targets
            .contains(&GroupKey::Station(StationId::new(7).unwrap())));
        assert!(event
            .targets
            .contains(&GroupKey::Agency(AgencyId::new(3).unwrap())));
    }

    #[test]
    fn event_with_unresolvable_scope_has_no_targets() {
        let scope = EventScope::incident(None, None);
        let event = DispatchEvent::new(EventKind::IncidentCreated, &scope, json!({}));
        assert!(event.targets.is_empty());
    }

    #[test]
    fn event_ids_are_unique_per_instance() {
        let scope = EventScope::global();
        let a = DispatchEvent::new(EventKind::GlobalBroadcast, &scope, json!({}));
        let b = DispatchEvent::new(EventKind::GlobalBroadcast, &scope, json!({}));
        assert_ne!(a.event_id, b.event_id);
    }

    #[test]
    fn typed_payload_round_trips() {
        let payload = AssignmentStatusChangedPayload {
            incident_id: IncidentId::new(),
            assignment_id: AssignmentId::new(),
            old_status: AssignmentStatus::Notified,
            new_status: AssignmentStatus::Finished,
            changed_by: UserId::new("d-1").unwrap(),
        };
        let event = DispatchEvent::from_payload(
            EventKind::AssignmentStatusChanged,
            &EventScope::incident(StationId::from_raw(7), AgencyId::from_raw(3)),
            &payload,
        );

        let restored: AssignmentStatusChangedPayload = event.payload_as().unwrap();
        assert_eq!(restored.assignment_id, payload.assignment_id);
        assert_eq!(restored.new_status, AssignmentStatus::Finished);
        assert_eq!(restored.changed_by.as_str(), "d-1");
        assert!(event.payload.get("changedBy").is_some());
    }

    #[test]
    fn payload_fields_serialize_camel_case() {
        let payload = IncidentLogAddedPayload {
            incident_id: IncidentId::new(),
            message: "water on".to_string(),
            logged_by: UserId::new("d-1").unwrap(),
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert!(value.get("incidentId").is_some());
        assert!(value.get("loggedBy").is_some());
    }

    #[test]
    fn event_kind_wire_names_are_dotted() {
        assert_eq!(EventKind::AssignmentStatusChanged.as_str(), "assignment.status_changed");
        assert_eq!(
            serde_json::to_string(&EventKind::IncidentCreated).unwrap(),
            "\"incident.created\""
        );
    }
}
