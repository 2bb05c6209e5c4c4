//! Client-side reconciliation of REST snapshots with push deltas.
//!
//! Connected clients hold a local view (incident list, assignment map)
//! obtained by periodic REST fetch and update it incrementally from
//! pushed events. Because the fan-out layer neither de-duplicates nor
//! orders across groups, the merge must be idempotent and treat any
//! unknown-entity event as an upsert, never as invalid: a status-changed
//! event may legitimately arrive before the create event it follows.
//!
//! This module is consumed by UI code; the core only defines the merge.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::domain::dispatch::{
    AssignmentStatus, AssignmentStatusChangedPayload, DispatchEvent, EventKind,
    IncidentCreatedPayload, IncidentStatusChangedPayload, IncidentStatus,
    ResourceAssignedPayload, ResourceType,
};
use crate::domain::foundation::{AgencyId, AssignmentId, IncidentId, StationId, UserId};

/// Local projection of one incident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentView {
    pub incident_id: IncidentId,
    pub station_id: Option<StationId>,
    pub agency_id: Option<AgencyId>,
    pub description: Option<String>,
    pub status: Option<IncidentStatus>,
}

impl IncidentView {
    /// Minimal projection when only the id is known.
    fn skeleton(incident_id: IncidentId) -> Self {
        Self {
            incident_id,
            station_id: None,
            agency_id: None,
            description: None,
            status: None,
        }
    }
}

/// Local projection of one assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentView {
    pub assignment_id: AssignmentId,
    pub incident_id: Option<IncidentId>,
    pub resource_type: Option<ResourceType>,
    pub resource_id: Option<i64>,
    pub status: Option<AssignmentStatus>,
    pub assigned_by: Option<UserId>,
}

impl AssignmentView {
    fn skeleton(assignment_id: AssignmentId) -> Self {
        Self {
            assignment_id,
            incident_id: None,
            resource_type: None,
            resource_id: None,
            status: None,
            assigned_by: None,
        }
    }
}

/// What a single `apply` call did to the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The event updated an entity the snapshot already knew.
    Applied,
    /// The event referenced an unknown entity; a minimal projection was
    /// patched in and a targeted re-fetch was scheduled.
    Upserted,
    /// The event does not affect this snapshot (roster changes,
    /// broadcasts, undecodable payloads).
    Ignored,
}

/// One client's consistent local view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchSnapshot {
    incidents: HashMap<IncidentId, IncidentView>,
    assignments: HashMap<AssignmentId, AssignmentView>,
    /// Incidents whose projection is incomplete and needs a targeted
    /// re-fetch on the next REST round-trip.
    stale: BTreeSet<IncidentId>,
}

impl DispatchSnapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the snapshot from a full REST fetch, replacing prior state.
    pub fn reset(&mut self, incidents: Vec<IncidentView>, assignments: Vec<AssignmentView>) {
        self.incidents = incidents.into_iter().map(|i| (i.incident_id, i)).collect();
        self.assignments = assignments
            .into_iter()
            .map(|a| (a.assignment_id, a))
            .collect();
        self.stale.clear();
    }

    /// Applies one pushed event to the local view.
    ///
    /// Idempotent: applying the same event twice leaves the snapshot in
    /// the same state as applying it once. Never fails; events this
    /// snapshot cannot use are ignored.
    pub fn apply(&mut self, event: &DispatchEvent) -> ApplyOutcome {
        match event.kind {
            EventKind::IncidentCreated => match event.payload_as::<IncidentCreatedPayload>() {
                Ok(p) => self.apply_incident_created(p),
                Err(_) => ApplyOutcome::Ignored,
            },
            EventKind::IncidentStatusChanged => {
                match event.payload_as::<IncidentStatusChangedPayload>() {
                    Ok(p) => self.apply_incident_status(p),
                    Err(_) => ApplyOutcome::Ignored,
                }
            }
            EventKind::ResourceAssigned => match event.payload_as::<ResourceAssignedPayload>() {
                Ok(p) => self.apply_resource_assigned(p),
                Err(_) => ApplyOutcome::Ignored,
            },
            EventKind::AssignmentStatusChanged => {
                match event.payload_as::<AssignmentStatusChangedPayload>() {
                    Ok(p) => self.apply_assignment_status(p),
                    Err(_) => ApplyOutcome::Ignored,
                }
            }
            // Log entries, roster changes, broadcasts and direct notices
            // do not alter the incident/assignment view.
            _ => ApplyOutcome::Ignored,
        }
    }

    fn apply_incident_created(&mut self, p: IncidentCreatedPayload) -> ApplyOutcome {
        let view = self
            .incidents
            .entry(p.incident_id)
            .or_insert_with(|| IncidentView::skeleton(p.incident_id));
        view.station_id = p.station_id;
        view.agency_id = p.agency_id;
        view.description = Some(p.description);
        view.status = Some(p.status);
        // A create event carries the full projection; nothing left to fetch.
        self.stale.remove(&p.incident_id);
        ApplyOutcome::Applied
    }

    fn apply_incident_status(&mut self, p: IncidentStatusChangedPayload) -> ApplyOutcome {
        if let Some(view) = self.incidents.get_mut(&p.incident_id) {
            view.status = Some(p.new_status);
            return ApplyOutcome::Applied;
        }
        let mut view = IncidentView::skeleton(p.incident_id);
        view.status = Some(p.new_status);
        self.incidents.insert(p.incident_id, view);
        self.stale.insert(p.incident_id);
        ApplyOutcome::Upserted
    }

    fn apply_resource_assigned(&mut self, p: ResourceAssignedPayload) -> ApplyOutcome {
        let view = self
            .assignments
            .entry(p.assignment_id)
            .or_insert_with(|| AssignmentView::skeleton(p.assignment_id));
        view.incident_id = Some(p.incident_id);
        view.resource_type = Some(p.resource_type);
        view.resource_id = Some(p.resource_id);
        // A later status change may already have been applied; do not
        // regress it with the assignment's initial status.
        if view.status.is_none() {
            view.status = Some(p.status);
        }
        view.assigned_by = Some(p.assigned_by);

        if !self.incidents.contains_key(&p.incident_id) {
            self.incidents
                .insert(p.incident_id, IncidentView::skeleton(p.incident_id));
            self.stale.insert(p.incident_id);
            return ApplyOutcome::Upserted;
        }
        ApplyOutcome::Applied
    }

    fn apply_assignment_status(&mut self, p: AssignmentStatusChangedPayload) -> ApplyOutcome {
        if let Some(view) = self.assignments.get_mut(&p.assignment_id) {
            view.status = Some(p.new_status);
            return ApplyOutcome::Applied;
        }
        // Status change arrived before the create event: upsert a minimal
        // projection and schedule a re-fetch for the incident.
        let mut view = AssignmentView::skeleton(p.assignment_id);
        view.incident_id = Some(p.incident_id);
        view.status = Some(p.new_status);
        self.assignments.insert(p.assignment_id, view);
        self.stale.insert(p.incident_id);
        ApplyOutcome::Upserted
    }

    /// Marks an incident's projection complete after a targeted re-fetch.
    pub fn refreshed(&mut self, incident_id: IncidentId, view: IncidentView) {
        self.incidents.insert(incident_id, view);
        self.stale.remove(&incident_id);
    }

    pub fn incident(&self, id: &IncidentId) -> Option<&IncidentView> {
        self.incidents.get(id)
    }

    pub fn assignment(&self, id: &AssignmentId) -> Option<&AssignmentView> {
        self.assignments.get(id)
    }

    /// Incidents scheduled for targeted re-fetch.
    pub fn stale_incidents(&self) -> impl Iterator<Item = &IncidentId> {
        self.stale.iter()
    }

    pub fn incident_count(&self) -> usize {
        self.incidents.len()
    }

    pub fn assignment_count(&self) -> usize {
        self.assignments.len()
    }
}
