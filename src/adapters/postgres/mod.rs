//! PostgreSQL adapter implementations.

pub mod assignment_store;
pub mod directory;
pub mod inbox_store;
pub mod incident_store;

pub use assignment_store::PostgresAssignmentStore;
pub use directory::PostgresGroupDirectory;
pub use inbox_store::PostgresInboxStore;
pub use incident_store::PostgresIncidentStore;
