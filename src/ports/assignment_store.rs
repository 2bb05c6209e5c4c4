//! Assignment store port.
//!
//! The durable store for assignments. Callers must serialize
//! check-then-insert per resource (the application service holds a
//! per-resource lock across `active_for_resource` + `insert`);
//! implementations backed by SQL additionally enforce the "one active
//! assignment per resource" rule with a partial unique constraint so the
//! invariant holds even against out-of-process writers.

use async_trait::async_trait;

use crate::domain::dispatch::{Assignment, ResourceRef};
use crate::domain::foundation::{AssignmentId, DispatchError, IncidentId};

/// Port for assignment persistence.
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    /// Inserts a new assignment.
    ///
    /// # Errors
    ///
    /// - `ResourceAlreadyAssigned` if a storage-level exclusivity
    ///   constraint rejects the insert
    /// - `Database` on persistence failure
    async fn insert(&self, assignment: &Assignment) -> Result<(), DispatchError>;

    /// Persists a status change.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the assignment does not exist
    /// - `Database` on persistence failure
    async fn update(&self, assignment: &Assignment) -> Result<(), DispatchError>;

    /// Finds an assignment by id. Returns `None` if not found.
    async fn find_by_id(&self, id: &AssignmentId) -> Result<Option<Assignment>, DispatchError>;

    /// Returns the active (non-terminal) assignment holding a resource,
    /// if any. This is the read side of the exclusivity invariant.
    async fn active_for_resource(
        &self,
        resource: ResourceRef,
    ) -> Result<Option<Assignment>, DispatchError>;

    /// Returns all assignments bound to an incident, newest first.
    async fn for_incident(&self, incident_id: &IncidentId)
        -> Result<Vec<Assignment>, DispatchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn AssignmentStore) {}
    }
}
