//! Resource identity types.
//!
//! A resource is anything a dispatcher can bind to an incident: a vehicle
//! or a member of personnel. The pair `(kind, id)` is the unit of the
//! assignment exclusivity invariant.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of dispatchable resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Vehicle,
    Personnel,
}

impl ResourceType {
    /// Canonical storage label.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Vehicle => "vehicle",
            ResourceType::Personnel => "personnel",
        }
    }

    /// Parses a storage label.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "vehicle" => Some(ResourceType::Vehicle),
            "personnel" => Some(ResourceType::Personnel),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to one concrete resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceRef {
    pub kind: ResourceType,
    pub id: i64,
}

impl ResourceRef {
    /// Creates a resource reference.
    pub fn new(kind: ResourceType, id: i64) -> Self {
        Self { kind, id }
    }

    /// Convenience constructor for a vehicle.
    pub fn vehicle(id: i64) -> Self {
        Self::new(ResourceType::Vehicle, id)
    }

    /// Convenience constructor for a member of personnel.
    pub fn personnel(id: i64) -> Self {
        Self::new(ResourceType::Personnel, id)
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}
