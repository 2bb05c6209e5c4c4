//! Typed group keys for event routing.
//!
//! Replaces the legacy stringly-typed group naming (`"Station_7"` style
//! concatenation) with a closed tagged union, so the router is a total
//! function over variants instead of string assembly. Group keys are used
//! only for routing and never persisted.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{AgencyId, RoleName, StationId, UserId};

/// A named audience for event delivery.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum GroupKey {
    /// All connections of one user (every tab/device).
    User(UserId),
    /// All connections scoped to one station.
    Station(StationId),
    /// All connections scoped to one agency.
    Agency(AgencyId),
    /// All connections holding a given role.
    Role(RoleName),
    /// Command-level dashboards, regardless of station or agency.
    Global,
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::User(id) => write!(f, "user:{}", id),
            GroupKey::Station(id) => write!(f, "station:{}", id),
            GroupKey::Agency(id) => write!(f, "agency:{}", id),
            GroupKey::Role(name) => write!(f, "role:{}", name),
            GroupKey::Global => write!(f, "global"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_keys_with_same_identity_are_equal() {
        assert_eq!(
            GroupKey::Station(StationId::new(7).unwrap()),
            GroupKey::Station(StationId::new(7).unwrap())
        );
        assert_ne!(
            GroupKey::Station(StationId::new(7).unwrap()),
            GroupKey::Agency(AgencyId::new(7).unwrap())
        );
    }

    #[test]
    fn display_is_readable_for_logs() {
        assert_eq!(
            GroupKey::Station(StationId::new(7).unwrap()).to_string(),
            "station:7"
        );
        assert_eq!(GroupKey::Global.to_string(), "global");
    }
}
