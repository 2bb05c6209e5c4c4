//! Assignment aggregate and its status state machine.
//!
//! An assignment binds one resource to one incident. Its lifecycle is
//! `notified -> on_scene -> finished`, with `unavailable` as a side
//! terminal reachable only from `notified`. A resource may hold at most
//! one active (non-terminal) assignment at any time; that exclusivity
//! check lives in the stores and the application service because it spans
//! aggregates, but terminality itself is decided here and nowhere else.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{
    AssignmentId, DispatchError, IncidentId, StateMachine, Timestamp, UserId,
};

use super::resource::ResourceRef;

/// Lifecycle status of an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    /// Resource has been alerted and is expected to respond.
    Notified,
    /// Resource arrived at the incident.
    OnScene,
    /// Assignment completed; resource is free again.
    Finished,
    /// Resource declined or could not respond; terminal.
    Unavailable,
}

impl AssignmentStatus {
    /// Canonical storage label.
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Notified => "notified",
            AssignmentStatus::OnScene => "on_scene",
            AssignmentStatus::Finished => "finished",
            AssignmentStatus::Unavailable => "unavailable",
        }
    }

    /// Parses a status label.
    ///
    /// The legacy call sites used `finished`, `completed` and `closed`
    /// interchangeably for the same terminal outcome; all three normalize
    /// to [`AssignmentStatus::Finished`] so terminality is decided by one
    /// predicate instead of repeated string checks.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "notified" => Some(AssignmentStatus::Notified),
            "on_scene" => Some(AssignmentStatus::OnScene),
            "finished" | "completed" | "closed" => Some(AssignmentStatus::Finished),
            "unavailable" => Some(AssignmentStatus::Unavailable),
            _ => None,
        }
    }
}

impl StateMachine for AssignmentStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use AssignmentStatus::*;
        matches!(
            (self, target),
            (Notified, OnScene) | (Notified, Unavailable) | (Notified, Finished) | (OnScene, Finished)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use AssignmentStatus::*;
        match self {
            Notified => vec![OnScene, Unavailable, Finished],
            OnScene => vec![Finished],
            Finished => vec![],
            Unavailable => vec![],
        }
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binding of one resource to one incident with its own lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    id: AssignmentId,
    incident_id: IncidentId,
    resource: ResourceRef,
    status: AssignmentStatus,
    assigned_by: UserId,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Assignment {
    /// Creates a fresh assignment in `notified` status.
    pub fn create(incident_id: IncidentId, resource: ResourceRef, assigned_by: UserId) -> Self {
        let now = Timestamp::now();
        Self {
            id: AssignmentId::new(),
            incident_id,
            resource,
            status: AssignmentStatus::Notified,
            assigned_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rehydrates an assignment from storage.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: AssignmentId,
        incident_id: IncidentId,
        resource: ResourceRef,
        status: AssignmentStatus,
        assigned_by: UserId,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            incident_id,
            resource,
            status,
            assigned_by,
            created_at,
            updated_at,
        }
    }

    /// Applies a validated status transition.
    ///
    /// Returns the previous status on success so the caller can emit a
    /// status-changed event carrying the `(old, new)` pair.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` if the requested status is not reachable from
    /// the current one (including any transition out of a terminal state).
    pub fn change_status(
        &mut self,
        target: AssignmentStatus,
    ) -> Result<AssignmentStatus, DispatchError> {
        if !self.status.can_transition_to(&target) {
            return Err(DispatchError::invalid_transition(self.status, target));
        }
        let old = self.status;
        self.status = target;
        self.updated_at = Timestamp::now();
        Ok(old)
    }

    /// True while the assignment occupies its resource.
    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    pub fn id(&self) -> AssignmentId {
        self.id
    }

    pub fn incident_id(&self) -> IncidentId {
        self.incident_id
    }

    pub fn resource(&self) -> ResourceRef {
        self.resource
    }

    pub fn status(&self) -> AssignmentStatus {
        self.status
    }

    pub fn assigned_by(&self) -> &UserId {
        &self.assigned_by
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }
}
