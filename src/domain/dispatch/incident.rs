//! Incident aggregate.
//!
//! Only the fields the notification core needs: identity, the station and
//! agency scope used for routing, and a coarse lifecycle status. Incident
//! taxonomy (categories, priorities, map data) belongs to the surrounding
//! application, not this core.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{AgencyId, IncidentId, StationId, Timestamp, UserId};

/// Coarse incident lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatus {
    Open,
    Closed,
}

impl IncidentStatus {
    /// Canonical storage label.
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentStatus::Open => "open",
            IncidentStatus::Closed => "closed",
        }
    }

    /// Parses a storage label.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(IncidentStatus::Open),
            "closed" => Some(IncidentStatus::Closed),
            _ => None,
        }
    }
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An emergency incident as seen by the notification core.
///
/// `station` and `agency` are optional: a freshly reported incident may
/// not be dispatched to a station yet, in which case events about it have
/// no resolvable audience.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    id: IncidentId,
    station: Option<StationId>,
    agency: Option<AgencyId>,
    description: String,
    status: IncidentStatus,
    reported_by: UserId,
    created_at: Timestamp,
}

impl Incident {
    /// Creates a new open incident.
    pub fn create(
        station: Option<StationId>,
        agency: Option<AgencyId>,
        description: impl Into<String>,
        reported_by: UserId,
    ) -> Self {
        Self {
            id: IncidentId::new(),
            station,
            agency,
            description: description.into(),
            status: IncidentStatus::Open,
            reported_by,
            created_at: Timestamp::now(),
        }
    }

    /// Rehydrates an incident from storage.
    pub fn from_parts(
        id: IncidentId,
        station: Option<StationId>,
        agency: Option<AgencyId>,
        description: String,
        status: IncidentStatus,
        reported_by: UserId,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            station,
            agency,
            description,
            status,
            reported_by,
            created_at,
        }
    }

    /// Replaces the lifecycle status, returning the previous one.
    pub fn set_status(&mut self, status: IncidentStatus) -> IncidentStatus {
        std::mem::replace(&mut self.status, status)
    }

    pub fn id(&self) -> IncidentId {
        self.id
    }

    pub fn station(&self) -> Option<StationId> {
        self.station
    }

    pub fn agency(&self) -> Option<AgencyId> {
        self.agency
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn status(&self) -> IncidentStatus {
        self.status
    }

    pub fn reported_by(&self) -> &UserId {
        &self.reported_by
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }
}
