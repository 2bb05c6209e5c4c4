//! Incident store port.

use async_trait::async_trait;

use crate::domain::dispatch::Incident;
use crate::domain::foundation::{DispatchError, IncidentId};

/// Port for incident persistence.
///
/// The core only needs enough of the incident to route events; the full
/// incident record (location, category, log) is owned by the surrounding
/// application.
#[async_trait]
pub trait IncidentStore: Send + Sync {
    /// Saves a new incident.
    ///
    /// # Errors
    ///
    /// - `Database` on persistence failure
    async fn save(&self, incident: &Incident) -> Result<(), DispatchError>;

    /// Persists a status change.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the incident does not exist
    /// - `Database` on persistence failure
    async fn update(&self, incident: &Incident) -> Result<(), DispatchError>;

    /// Finds an incident by id. Returns `None` if not found.
    async fn find_by_id(&self, id: &IncidentId) -> Result<Option<Incident>, DispatchError>;
}
