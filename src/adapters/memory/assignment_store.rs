//! In-memory assignment store for tests and local development.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::dispatch::{Assignment, ResourceRef};
use crate::domain::foundation::{AssignmentId, DispatchError, IncidentId};
use crate::ports::AssignmentStore;

/// [`AssignmentStore`] backed by a HashMap.
///
/// Enforces the same one-active-assignment-per-resource rule as the SQL
/// store's partial unique index, inside a single write lock.
pub struct InMemoryAssignmentStore {
    assignments: RwLock<HashMap<AssignmentId, Assignment>>,
}

impl InMemoryAssignmentStore {
    pub fn new() -> Self {
        Self {
            assignments: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.assignments.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryAssignmentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssignmentStore for InMemoryAssignmentStore {
    async fn insert(&self, assignment: &Assignment) -> Result<(), DispatchError> {
        let mut assignments = self.assignments.write().expect("lock poisoned");
        let occupied = assignments
            .values()
            .any(|a| a.resource() == assignment.resource() && a.is_active());
        if occupied && assignment.is_active() {
            let resource = assignment.resource();
            return Err(DispatchError::already_assigned(
                resource.kind.as_str(),
                resource.id,
            ));
        }
        assignments.insert(assignment.id(), assignment.clone());
        Ok(())
    }

    async fn update(&self, assignment: &Assignment) -> Result<(), DispatchError> {
        let mut assignments = self.assignments.write().expect("lock poisoned");
        if !assignments.contains_key(&assignment.id()) {
            return Err(DispatchError::not_found(
                "assignment",
                assignment.id().to_string(),
            ));
        }
        // An update written from a stale snapshot must not put a second
        // active assignment on a resource someone else now holds.
        if assignment.is_active() {
            let occupied = assignments.values().any(|a| {
                a.id() != assignment.id() && a.resource() == assignment.resource() && a.is_active()
            });
            if occupied {
                let resource = assignment.resource();
                return Err(DispatchError::already_assigned(
                    resource.kind.as_str(),
                    resource.id,
                ));
            }
        }
        assignments.insert(assignment.id(), assignment.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &AssignmentId) -> Result<Option<Assignment>, DispatchError> {
        Ok(self
            .assignments
            .read()
            .expect("lock poisoned")
            .get(id)
            .cloned())
    }

    async fn active_for_resource(
        &self,
        resource: ResourceRef,
    ) -> Result<Option<Assignment>, DispatchError> {
        Ok(self
            .assignments
            .read()
            .expect("lock poisoned")
            .values()
            .find(|a| a.resource() == resource && a.is_active())
            .cloned())
    }

    async fn for_incident(
        &self,
        incident_id: &IncidentId,
    ) -> Result<Vec<Assignment>, DispatchError> {
        let mut matching: Vec<Assignment> = self
            .assignments
            .read()
            .expect("lock poisoned")
            .values()
            .filter(|a| a.incident_id() == *incident_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(matching)
    }
}
