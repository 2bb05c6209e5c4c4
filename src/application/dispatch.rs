//! Dispatch service: the inbound operation surface.
//!
//! Every mutating operation follows the same shape: validate, commit the
//! durable write, then run exactly one router → fan-out → recorder
//! sequence for the resulting event. Fan-out and recording are best
//! effort; once the write commits, the operation reports success no
//! matter what the notification side does.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::dispatch::{
    Assignment, AssignmentStatus, AssignmentStatusChangedPayload, BroadcastPayload, DispatchEvent,
    EventKind, Incident, IncidentCreatedPayload, IncidentLogAddedPayload, IncidentStatus,
    IncidentStatusChangedPayload, ResourceAssignedPayload, ResourceRef, ResourceType,
    RosterChangePayload, UserNoticePayload,
};
use crate::domain::foundation::{
    AgencyId, AssignmentId, DispatchError, InboxEntryId, IncidentId, RoleName, StationId, UserId,
    ValidationError,
};
use crate::domain::notification::InboxEntry;
use crate::domain::routing::EventScope;
use crate::ports::{AssignmentStore, EventFanout, IncidentStore};

use super::recorder::NotificationRecorder;

/// What happened to a roster or fleet entity.
///
/// The CRUD itself lives in the surrounding application; this service
/// only turns the change into notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterAction {
    Created,
    Updated,
    Deleted,
}

impl RosterAction {
    fn event_kind(self, resource_type: ResourceType) -> EventKind {
        match (resource_type, self) {
            (ResourceType::Personnel, RosterAction::Created) => EventKind::PersonnelCreated,
            (ResourceType::Personnel, RosterAction::Updated) => EventKind::PersonnelUpdated,
            (ResourceType::Personnel, RosterAction::Deleted) => EventKind::PersonnelDeleted,
            (ResourceType::Vehicle, RosterAction::Created) => EventKind::VehicleCreated,
            (ResourceType::Vehicle, RosterAction::Updated) => EventKind::VehicleUpdated,
            (ResourceType::Vehicle, RosterAction::Deleted) => EventKind::VehicleDeleted,
        }
    }
}

/// Orchestrates stores, the state machine, routing, fan-out and inbox
/// recording behind one inbound surface.
pub struct DispatchService {
    incidents: Arc<dyn IncidentStore>,
    assignments: Arc<dyn AssignmentStore>,
    fanout: Arc<dyn EventFanout>,
    recorder: Arc<NotificationRecorder>,
    /// Per-resource mutexes serializing check-then-insert for exclusivity.
    resource_locks: Mutex<HashMap<ResourceRef, Arc<Mutex<()>>>>,
}

impl DispatchService {
    pub fn new(
        incidents: Arc<dyn IncidentStore>,
        assignments: Arc<dyn AssignmentStore>,
        fanout: Arc<dyn EventFanout>,
        recorder: Arc<NotificationRecorder>,
    ) -> Self {
        Self {
            incidents,
            assignments,
            fanout,
            recorder,
            resource_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Creates an open incident and notifies its station.
    pub async fn create_incident(
        &self,
        station: Option<StationId>,
        agency: Option<AgencyId>,
        description: String,
        reported_by: UserId,
    ) -> Result<Incident, DispatchError> {
        if description.trim().is_empty() {
            return Err(ValidationError::empty_field("description").into());
        }

        let incident = Incident::create(station, agency, description, reported_by);
        self.incidents.save(&incident).await?;

        let event = DispatchEvent::from_payload(
            EventKind::IncidentCreated,
            &EventScope::incident(incident.station(), incident.agency()),
            &IncidentCreatedPayload {
                incident_id: incident.id(),
                station_id: incident.station(),
                agency_id: incident.agency(),
                description: incident.description().to_string(),
                status: incident.status(),
                created_at: incident.created_at(),
            },
        );
        self.emit(event).await;

        Ok(incident)
    }

    /// Replaces an incident's lifecycle status.
    ///
    /// Setting the status it already has is a no-op and emits nothing.
    pub async fn set_incident_status(
        &self,
        incident_id: &IncidentId,
        status: IncidentStatus,
    ) -> Result<Incident, DispatchError> {
        let mut incident = self
            .incidents
            .find_by_id(incident_id)
            .await?
            .ok_or_else(|| DispatchError::not_found("incident", incident_id))?;

        if incident.status() == status {
            return Ok(incident);
        }

        let old = incident.set_status(status);
        self.incidents.update(&incident).await?;

        let event = DispatchEvent::from_payload(
            EventKind::IncidentStatusChanged,
            &EventScope::incident(incident.station(), incident.agency()),
            &IncidentStatusChangedPayload {
                incident_id: incident.id(),
                old_status: old,
                new_status: incident.status(),
            },
        );
        self.emit(event).await;

        Ok(incident)
    }

    /// Notifies an incident's audience about a new log entry.
    ///
    /// The log record itself is persisted by the surrounding application;
    /// this only fans the news out.
    pub async fn add_incident_log(
        &self,
        incident_id: &IncidentId,
        message: String,
        logged_by: UserId,
    ) -> Result<(), DispatchError> {
        if message.trim().is_empty() {
            return Err(ValidationError::empty_field("message").into());
        }

        let incident = self
            .incidents
            .find_by_id(incident_id)
            .await?
            .ok_or_else(|| DispatchError::not_found("incident", incident_id))?;

        let event = DispatchEvent::from_payload(
            EventKind::IncidentLogAdded,
            &EventScope::incident(incident.station(), incident.agency()),
            &IncidentLogAddedPayload {
                incident_id: incident.id(),
                message,
                logged_by,
            },
        );
        self.emit(event).await;

        Ok(())
    }

    /// Binds a resource to an incident.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the incident does not exist
    /// - `ResourceAlreadyAssigned` if the resource holds an active
    ///   assignment; concurrent calls for the same resource are serialized
    ///   so exactly one of them wins
    pub async fn assign_resource(
        &self,
        incident_id: &IncidentId,
        resource: ResourceRef,
        assigned_by: UserId,
    ) -> Result<Assignment, DispatchError> {
        let incident = self
            .incidents
            .find_by_id(incident_id)
            .await?
            .ok_or_else(|| DispatchError::not_found("incident", incident_id))?;

        let lock = self.resource_lock(resource).await;
        let assignment = {
            let _guard = lock.lock().await;

            if let Some(holder) = self.assignments.active_for_resource(resource).await? {
                tracing::debug!(
                    resource = %resource,
                    holder = %holder.id(),
                    "assignment rejected, resource occupied"
                );
                return Err(DispatchError::already_assigned(
                    resource.kind.as_str(),
                    resource.id,
                ));
            }

            let assignment = Assignment::create(incident.id(), resource, assigned_by);
            self.assignments.insert(&assignment).await?;
            assignment
        };
        // Lock released before fan-out: notification I/O never runs
        // while holding the resource lock.

        let event = DispatchEvent::from_payload(
            EventKind::ResourceAssigned,
            &EventScope::incident(incident.station(), incident.agency()),
            &ResourceAssignedPayload {
                incident_id: incident.id(),
                assignment_id: assignment.id(),
                resource_type: resource.kind,
                resource_id: resource.id,
                status: assignment.status(),
                assigned_by: assignment.assigned_by().clone(),
            },
        );
        self.emit(event).await;

        Ok(assignment)
    }

    /// Applies a status transition to an assignment.
    ///
    /// Transitions share the resource lock with `assign_resource`, so
    /// concurrent requests for one assignment settle one at a time and a
    /// request validated against a stale snapshot is re-checked before
    /// the write.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the assignment does not exist
    /// - `InvalidTransition` if the target is not reachable from the
    ///   current status
    pub async fn set_assignment_status(
        &self,
        assignment_id: &AssignmentId,
        status: AssignmentStatus,
        changed_by: UserId,
    ) -> Result<Assignment, DispatchError> {
        let current = self
            .assignments
            .find_by_id(assignment_id)
            .await?
            .ok_or_else(|| DispatchError::not_found("assignment", assignment_id))?;

        let lock = self.resource_lock(current.resource()).await;
        let (assignment, old) = {
            let _guard = lock.lock().await;

            // Re-read under the lock; a concurrent transition may have
            // landed since the lookup above.
            let mut assignment = self
                .assignments
                .find_by_id(assignment_id)
                .await?
                .ok_or_else(|| DispatchError::not_found("assignment", assignment_id))?;

            let old = assignment.change_status(status)?;
            self.assignments.update(&assignment).await?;
            (assignment, old)
        };

        // The incident may have been purged; the status change still
        // stands, it just has a smaller audience.
        let scope = match self.incidents.find_by_id(&assignment.incident_id()).await? {
            Some(incident) => EventScope::incident(incident.station(), incident.agency()),
            None => EventScope::incident(None, None),
        };

        let event = DispatchEvent::from_payload(
            EventKind::AssignmentStatusChanged,
            &scope,
            &AssignmentStatusChangedPayload {
                incident_id: assignment.incident_id(),
                assignment_id: assignment.id(),
                old_status: old,
                new_status: assignment.status(),
                changed_by,
            },
        );
        self.emit(event).await;

        Ok(assignment)
    }

    /// Fans out a personnel roster change.
    pub async fn record_personnel_change(
        &self,
        action: RosterAction,
        personnel_id: i64,
        display_name: Option<String>,
        station: Option<StationId>,
        agency: Option<AgencyId>,
    ) {
        self.record_roster_change(
            action,
            ResourceRef::personnel(personnel_id),
            display_name,
            station,
            agency,
        )
        .await;
    }

    /// Fans out a vehicle fleet change.
    pub async fn record_vehicle_change(
        &self,
        action: RosterAction,
        vehicle_id: i64,
        display_name: Option<String>,
        station: Option<StationId>,
        agency: Option<AgencyId>,
    ) {
        self.record_roster_change(
            action,
            ResourceRef::vehicle(vehicle_id),
            display_name,
            station,
            agency,
        )
        .await;
    }

    async fn record_roster_change(
        &self,
        action: RosterAction,
        resource: ResourceRef,
        display_name: Option<String>,
        station: Option<StationId>,
        agency: Option<AgencyId>,
    ) {
        let event = DispatchEvent::from_payload(
            action.event_kind(resource.kind),
            &EventScope::incident(station, agency),
            &RosterChangePayload {
                resource_type: resource.kind,
                resource_id: resource.id,
                display_name,
            },
        );
        self.emit(event).await;
    }

    /// Broadcasts a message to every holder of a role.
    pub async fn broadcast_to_role(
        &self,
        role: RoleName,
        title: String,
        message: String,
    ) -> Result<(), DispatchError> {
        if title.trim().is_empty() {
            return Err(ValidationError::empty_field("title").into());
        }

        let event = DispatchEvent::from_payload(
            EventKind::RoleBroadcast,
            &EventScope::role(role),
            &BroadcastPayload { title, message },
        );
        self.emit(event).await;
        Ok(())
    }

    /// Broadcasts a message to command-level dashboards.
    pub async fn broadcast_global(
        &self,
        title: String,
        message: String,
    ) -> Result<(), DispatchError> {
        if title.trim().is_empty() {
            return Err(ValidationError::empty_field("title").into());
        }

        let event = DispatchEvent::from_payload(
            EventKind::GlobalBroadcast,
            &EventScope::global(),
            &BroadcastPayload { title, message },
        );
        self.emit(event).await;
        Ok(())
    }

    /// Sends a direct notice to one user.
    pub async fn notify_user(
        &self,
        user_id: UserId,
        title: String,
        message: String,
        incident_id: Option<IncidentId>,
    ) -> Result<(), DispatchError> {
        if title.trim().is_empty() {
            return Err(ValidationError::empty_field("title").into());
        }

        let event = DispatchEvent::from_payload(
            EventKind::UserNotice,
            &EventScope::user(user_id),
            &UserNoticePayload {
                title,
                message,
                incident_id,
            },
        );
        self.emit(event).await;
        Ok(())
    }

    /// Returns the active assignment holding a resource, if any.
    pub async fn active_assignment(
        &self,
        resource: ResourceRef,
    ) -> Result<Option<Assignment>, DispatchError> {
        self.assignments.active_for_resource(resource).await
    }

    /// Returns an incident's assignments, newest first.
    pub async fn assignments_for_incident(
        &self,
        incident_id: &IncidentId,
    ) -> Result<Vec<Assignment>, DispatchError> {
        self.assignments.for_incident(incident_id).await
    }

    /// Looks up one incident.
    pub async fn incident(&self, id: &IncidentId) -> Result<Option<Incident>, DispatchError> {
        self.incidents.find_by_id(id).await
    }

    /// Lists a user's inbox, newest first.
    pub async fn inbox_for(
        &self,
        user_id: &UserId,
        unread_only: bool,
    ) -> Result<Vec<InboxEntry>, DispatchError> {
        self.recorder.inbox_for(user_id, unread_only).await
    }

    /// Marks one inbox entry read. Unknown id is a no-op.
    pub async fn mark_inbox_read(&self, entry_id: &InboxEntryId) -> Result<(), DispatchError> {
        self.recorder.mark_read(entry_id).await
    }

    /// Marks all of a user's inbox entries read.
    pub async fn mark_inbox_all_read(&self, user_id: &UserId) -> Result<(), DispatchError> {
        self.recorder.mark_all_read(user_id).await
    }

    /// Removes one inbox entry. Unknown id is a no-op.
    pub async fn remove_inbox_entry(&self, entry_id: &InboxEntryId) -> Result<(), DispatchError> {
        self.recorder.remove(entry_id).await
    }

    /// Removes all of a user's inbox entries.
    pub async fn clear_inbox(&self, user_id: &UserId) -> Result<(), DispatchError> {
        self.recorder.clear_all(user_id).await
    }

    /// One fan-out plus one recording pass per event, both best effort.
    async fn emit(&self, event: DispatchEvent) {
        let _report = self.fanout.publish(&event).await;
        self.recorder.record(&event).await;
    }

    async fn resource_lock(&self, resource: ResourceRef) -> Arc<Mutex<()>> {
        let mut locks = self.resource_locks.lock().await;
        // Entries only the map still references belong to completed
        // operations; shed them so the map tracks in-flight work only.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks.entry(resource).or_default().clone()
    }
}
