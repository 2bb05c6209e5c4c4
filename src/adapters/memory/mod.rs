//! In-memory adapter implementations for tests and local development.

pub mod assignment_store;
pub mod directory;
pub mod inbox_store;
pub mod incident_store;

pub use assignment_store::InMemoryAssignmentStore;
pub use directory::InMemoryGroupDirectory;
pub use inbox_store::InMemoryInboxStore;
pub use incident_store::InMemoryIncidentStore;
