//! Dispatch domain: incidents, resources, assignments and their events.

mod assignment;
mod events;
mod incident;
mod resource;

pub use assignment::{Assignment, AssignmentStatus};
pub use events::{
    AssignmentStatusChangedPayload, BroadcastPayload, DispatchEvent, EventKind,
    IncidentCreatedPayload, IncidentLogAddedPayload, IncidentStatusChangedPayload,
    ResourceAssignedPayload, RosterChangePayload, UserNoticePayload,
};
pub use incident::{Incident, IncidentStatus};
pub use resource::{ResourceRef, ResourceType};
