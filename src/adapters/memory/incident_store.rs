//! In-memory incident store for tests and local development.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::dispatch::Incident;
use crate::domain::foundation::{DispatchError, IncidentId};
use crate::ports::IncidentStore;

/// [`IncidentStore`] backed by a HashMap.
pub struct InMemoryIncidentStore {
    incidents: RwLock<HashMap<IncidentId, Incident>>,
}

impl InMemoryIncidentStore {
    pub fn new() -> Self {
        Self {
            incidents: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.incidents.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryIncidentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IncidentStore for InMemoryIncidentStore {
    async fn save(&self, incident: &Incident) -> Result<(), DispatchError> {
        self.incidents
            .write()
            .expect("lock poisoned")
            .insert(incident.id(), incident.clone());
        Ok(())
    }

    async fn update(&self, incident: &Incident) -> Result<(), DispatchError> {
        let mut incidents = self.incidents.write().expect("lock poisoned");
        if !incidents.contains_key(&incident.id()) {
            return Err(DispatchError::not_found("incident", incident.id().to_string()));
        }
        incidents.insert(incident.id(), incident.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &IncidentId) -> Result<Option<Incident>, DispatchError> {
        Ok(self
            .incidents
            .read()
            .expect("lock poisoned")
            .get(id)
            .cloned())
    }
}
