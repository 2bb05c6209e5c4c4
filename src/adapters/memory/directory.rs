//! In-memory group directory for tests and local development.
//!
//! Production deployments resolve group membership from the user store;
//! this double is seeded explicitly per test.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::foundation::{DispatchError, UserId};
use crate::domain::routing::GroupKey;
use crate::ports::GroupDirectory;

/// [`GroupDirectory`] backed by a seeded membership map.
pub struct InMemoryGroupDirectory {
    members: RwLock<HashMap<GroupKey, Vec<UserId>>>,
}

impl InMemoryGroupDirectory {
    pub fn new() -> Self {
        Self {
            members: RwLock::new(HashMap::new()),
        }
    }

    /// Adds a user to a group's membership.
    pub fn add_member(&self, group: GroupKey, user: UserId) {
        let mut members = self.members.write().expect("lock poisoned");
        let list = members.entry(group).or_default();
        if !list.contains(&user) {
            list.push(user);
        }
    }
}

impl Default for InMemoryGroupDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GroupDirectory for InMemoryGroupDirectory {
    async fn users_in(&self, group: &GroupKey) -> Result<Vec<UserId>, DispatchError> {
        // A user group is its own membership; no seeding needed.
        if let GroupKey::User(user) = group {
            return Ok(vec![user.clone()]);
        }
        Ok(self
            .members
            .read()
            .expect("lock poisoned")
            .get(group)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::StationId;

    #[test]
    fn add_member_deduplicates() {
        let directory = InMemoryGroupDirectory::new();
        let group = GroupKey::Station(StationId::new(7).unwrap());
        let user = UserId::new("u-1").unwrap();

        directory.add_member(group.clone(), user.clone());
        directory.add_member(group, user);

        let members = directory.members.read().unwrap();
        assert_eq!(members.values().next().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn user_group_resolves_to_itself() {
        let directory = InMemoryGroupDirectory::new();
        let user = UserId::new("u-1").unwrap();

        let resolved = directory.users_in(&GroupKey::User(user.clone())).await.unwrap();
        assert_eq!(resolved, vec![user]);
    }

    #[tokio::test]
    async fn unknown_group_resolves_to_empty() {
        let directory = InMemoryGroupDirectory::new();
        assert!(directory.users_in(&GroupKey::Global).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn seeded_station_resolves_its_roster() {
        let directory = InMemoryGroupDirectory::new();
        let group = GroupKey::Station(StationId::new(7).unwrap());
        directory.add_member(group.clone(), UserId::new("u-1").unwrap());
        directory.add_member(group.clone(), UserId::new("u-2").unwrap());

        let resolved = directory.users_in(&group).await.unwrap();
        assert_eq!(resolved.len(), 2);
    }
}
