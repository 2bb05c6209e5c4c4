//! Group router: maps a domain event to its target groups.
//!
//! Pure function from event kind and routing scope to a set of group
//! keys. Targets are computed exactly once, when the event is
//! constructed, never per connection.

use std::collections::BTreeSet;

use crate::domain::dispatch::EventKind;
use crate::domain::foundation::{AgencyId, RoleName, StationId, UserId};

use super::group::GroupKey;

/// Routing scope extracted from an event's domain fields.
///
/// Which fields are set depends on the event: station/agency come from the
/// incident or roster entity, `role` from a role broadcast, and `user`
/// marks a direct user notification that bypasses group rules entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventScope {
    pub station: Option<StationId>,
    pub agency: Option<AgencyId>,
    pub role: Option<RoleName>,
    pub user: Option<UserId>,
}

impl EventScope {
    /// Scope for an incident-bound event.
    pub fn incident(station: Option<StationId>, agency: Option<AgencyId>) -> Self {
        Self {
            station,
            agency,
            ..Self::default()
        }
    }

    /// Scope for a role broadcast.
    pub fn role(role: RoleName) -> Self {
        Self {
            role: Some(role),
            ..Self::default()
        }
    }

    /// Scope for a direct user notification.
    pub fn user(user: UserId) -> Self {
        Self {
            user: Some(user),
            ..Self::default()
        }
    }

    /// Scope for a global broadcast (no domain fields needed).
    pub fn global() -> Self {
        Self::default()
    }
}

/// Resolves the set of groups an event must reach.
///
/// An event with no resolvable target (e.g. an incident not yet dispatched
/// to any station) yields the empty set: it is recorded for audit by the
/// publisher but fans out to nobody. That is not an error.
pub fn resolve_targets(kind: EventKind, scope: &EventScope) -> BTreeSet<GroupKey> {
    let mut targets = BTreeSet::new();

    // Direct user notifications bypass group rules entirely.
    if let Some(user) = &scope.user {
        targets.insert(GroupKey::User(user.clone()));
        return targets;
    }

    match kind {
        EventKind::IncidentCreated => {
            if let Some(station) = scope.station {
                targets.insert(GroupKey::Station(station));
            }
        }
        EventKind::IncidentStatusChanged
        | EventKind::ResourceAssigned
        | EventKind::AssignmentStatusChanged
        | EventKind::IncidentLogAdded => {
            // Deliberate duplication: station- and agency-scoped dashboards
            // both update without cross-subscribing.
            if let Some(station) = scope.station {
                targets.insert(GroupKey::Station(station));
            }
            if let Some(agency) = scope.agency {
                targets.insert(GroupKey::Agency(agency));
            }
        }
        EventKind::PersonnelCreated
        | EventKind::PersonnelUpdated
        | EventKind::PersonnelDeleted
        | EventKind::VehicleCreated
        | EventKind::VehicleUpdated
        | EventKind::VehicleDeleted => {
            if let Some(station) = scope.station {
                targets.insert(GroupKey::Station(station));
            }
            if let Some(agency) = scope.agency {
                targets.insert(GroupKey::Agency(agency));
            }
            targets.insert(GroupKey::Global);
        }
        EventKind::RoleBroadcast => {
            if let Some(role) = &scope.role {
                targets.insert(GroupKey::Role(role.clone()));
            }
        }
        EventKind::GlobalBroadcast => {
            targets.insert(GroupKey::Global);
        }
        // Without a user in scope there is nobody to notify directly.
        EventKind::UserNotice => {}
    }

    targets
}
