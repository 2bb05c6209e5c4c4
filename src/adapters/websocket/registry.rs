//! Connection registry: live sockets indexed by routing group.
//!
//! Each connection owns a bounded mpsc queue; the socket task drains it
//! onto the wire. Publishing uses `try_send`, so one stalled consumer can
//! fill only its own queue and never blocks a publish or another client.
//!
//! # Thread Safety
//!
//! A single `RwLock` guards both indexes (connection → handle and
//! group → members) so registration and cleanup stay atomic. Publishes
//! take the read lock only.

use std::collections::{BTreeSet, HashMap, HashSet};

use tokio::sync::{mpsc, RwLock};

use crate::domain::foundation::{AgencyId, ConnectionId, RoleName, StationId, UserId};
use crate::domain::routing::GroupKey;

use super::messages::ServerMessage;

/// Roles whose holders see command-level (global) traffic.
const GLOBAL_ROLES: &[&str] = &["dispatcher", "commander"];

/// Who is on the other end of a socket, as claimed at connect time.
///
/// Group memberships are derived from this once, at registration; a role
/// or station change takes effect on the next reconnect.
#[derive(Debug, Clone)]
pub struct ClientIdentity {
    pub user_id: UserId,
    pub station: Option<StationId>,
    pub agency: Option<AgencyId>,
    pub roles: Vec<RoleName>,
}

impl ClientIdentity {
    /// Derives the full set of groups this identity subscribes to.
    pub fn memberships(&self) -> BTreeSet<GroupKey> {
        let mut groups = BTreeSet::new();
        groups.insert(GroupKey::User(self.user_id.clone()));
        if let Some(station) = self.station {
            groups.insert(GroupKey::Station(station));
        }
        if let Some(agency) = self.agency {
            groups.insert(GroupKey::Agency(agency));
        }
        for role in &self.roles {
            groups.insert(GroupKey::Role(role.clone()));
        }
        if self
            .roles
            .iter()
            .any(|r| GLOBAL_ROLES.contains(&r.as_str()))
        {
            groups.insert(GroupKey::Global);
        }
        groups
    }
}

/// Send side of one connection's outbound queue.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pub id: ConnectionId,
    pub sender: mpsc::Sender<ServerMessage>,
}

struct ConnectionEntry {
    sender: mpsc::Sender<ServerMessage>,
    groups: BTreeSet<GroupKey>,
}

struct RegistryState {
    connections: HashMap<ConnectionId, ConnectionEntry>,
    groups: HashMap<GroupKey, HashSet<ConnectionId>>,
}

/// Registry of live connections, indexed by group for fan-out.
pub struct ConnectionRegistry {
    state: RwLock<RegistryState>,
    /// Outbound queue depth per connection.
    queue_capacity: usize,
}

impl ConnectionRegistry {
    /// Creates a registry with the given per-connection queue capacity.
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            state: RwLock::new(RegistryState {
                connections: HashMap::new(),
                groups: HashMap::new(),
            }),
            queue_capacity,
        }
    }

    /// Create with default queue capacity (64 messages).
    pub fn with_default_capacity() -> Self {
        Self::new(64)
    }

    /// Registers a connection under every group its identity derives.
    ///
    /// Returns the connection id, a handle for pushing messages back to
    /// this client (pongs), and the receive side the socket task drains.
    pub async fn register(
        &self,
        identity: &ClientIdentity,
    ) -> (ConnectionHandle, mpsc::Receiver<ServerMessage>) {
        let id = ConnectionId::new();
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        let groups = identity.memberships();

        let mut state = self.state.write().await;
        for group in &groups {
            state.groups.entry(group.clone()).or_default().insert(id);
        }
        state.connections.insert(
            id,
            ConnectionEntry {
                sender: tx.clone(),
                groups,
            },
        );

        (ConnectionHandle { id, sender: tx }, rx)
    }

    /// Removes a connection from every group it belongs to.
    ///
    /// Unknown ids are a no-op, so disconnect cleanup and publish-side
    /// dead-connection sweeps can race safely.
    pub async fn unregister(&self, id: &ConnectionId) {
        let mut state = self.state.write().await;
        if let Some(entry) = state.connections.remove(id) {
            for group in &entry.groups {
                if let Some(members) = state.groups.get_mut(group) {
                    members.remove(id);
                    if members.is_empty() {
                        state.groups.remove(group);
                    }
                }
            }
        }
    }

    /// Snapshot of the senders currently subscribed to a group.
    pub async fn members_of(&self, group: &GroupKey) -> Vec<ConnectionHandle> {
        let state = self.state.read().await;
        let Some(members) = state.groups.get(group) else {
            return Vec::new();
        };
        members
            .iter()
            .filter_map(|id| {
                state.connections.get(id).map(|entry| ConnectionHandle {
                    id: *id,
                    sender: entry.sender.clone(),
                })
            })
            .collect()
    }

    /// Number of connections in one group (0 if the group is empty).
    pub async fn group_size(&self, group: &GroupKey) -> usize {
        let state = self.state.read().await;
        state.groups.get(group).map(|m| m.len()).unwrap_or(0)
    }

    /// Total live connections (for monitoring).
    pub async fn connection_count(&self) -> usize {
        self.state.read().await.connections.len()
    }

    /// All groups with at least one member (for monitoring/debugging).
    pub async fn active_groups(&self) -> Vec<GroupKey> {
        self.state.read().await.groups.keys().cloned().collect()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(user: &str, station: Option<i64>, agency: Option<i64>, roles: &[&str]) -> ClientIdentity {
        ClientIdentity {
            user_id: UserId::new(user).unwrap(),
            station: station.and_then(StationId::from_raw),
            agency: agency.and_then(AgencyId::from_raw),
            roles: roles.iter().map(|r| RoleName::new(*r).unwrap()).collect(),
        }
    }

    #[test]
    fn memberships_cover_user_station_agency_and_roles() {
        let groups = identity("u-1", Some(7), Some(3), &["medic"]).memberships();

        assert!(groups.contains(&GroupKey::User(UserId::new("u-1").unwrap())));
        assert!(groups.contains(&GroupKey::Station(StationId::new(7).unwrap())));
        assert!(groups.contains(&GroupKey::Agency(AgencyId::new(3).unwrap())));
        assert!(groups.contains(&GroupKey::Role(RoleName::new("medic").unwrap())));
        assert!(!groups.contains(&GroupKey::Global));
    }

    #[test]
    fn dispatcher_role_joins_global() {
        let groups = identity("u-2", None, None, &["dispatcher"]).memberships();
        assert!(groups.contains(&GroupKey::Global));
    }

    #[tokio::test]
    async fn register_indexes_connection_under_its_groups() {
        let registry = ConnectionRegistry::with_default_capacity();
        let (handle, _rx) = registry.register(&identity("u-1", Some(7), None, &[])).await;

        let station = GroupKey::Station(StationId::new(7).unwrap());
        assert_eq!(registry.group_size(&station).await, 1);
        let members = registry.members_of(&station).await;
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].id, handle.id);
    }

    #[tokio::test]
    async fn unregister_removes_from_every_group() {
        let registry = ConnectionRegistry::with_default_capacity();
        let (handle, _rx) = registry
            .register(&identity("u-1", Some(7), Some(3), &["medic"]))
            .await;

        registry.unregister(&handle.id).await;

        assert_eq!(registry.connection_count().await, 0);
        assert!(registry.active_groups().await.is_empty());
    }

    #[tokio::test]
    async fn unregister_unknown_id_is_noop() {
        let registry = ConnectionRegistry::with_default_capacity();
        registry.unregister(&ConnectionId::new()).await;
        assert_eq!(registry.connection_count().await, 0);
    }

    #[tokio::test]
    async fn two_tabs_of_one_user_are_separate_connections() {
        let registry = ConnectionRegistry::with_default_capacity();
        let who = identity("u-1", Some(7), None, &[]);
        let (a, _rx_a) = registry.register(&who).await;
        let (b, _rx_b) = registry.register(&who).await;

        assert_ne!(a.id, b.id);
        let user_group = GroupKey::User(UserId::new("u-1").unwrap());
        assert_eq!(registry.group_size(&user_group).await, 2);
    }

    #[tokio::test]
    async fn members_of_empty_group_is_empty() {
        let registry = ConnectionRegistry::with_default_capacity();
        assert!(registry.members_of(&GroupKey::Global).await.is_empty());
    }

    #[tokio::test]
    async fn handle_delivers_into_the_connections_queue() {
        let registry = ConnectionRegistry::with_default_capacity();
        let (handle, mut rx) = registry.register(&identity("u-1", None, None, &[])).await;

        handle
            .sender
            .try_send(ServerMessage::Pong(super::super::messages::PongMessage::now()))
            .unwrap();

        assert!(matches!(rx.recv().await, Some(ServerMessage::Pong(_))));
    }
}
