//! Ports: the trait seams between the application core and its adapters.

pub mod assignment_store;
pub mod event_fanout;
pub mod group_directory;
pub mod inbox_store;
pub mod incident_store;

pub use assignment_store::AssignmentStore;
pub use event_fanout::{DeliveryReport, EventFanout, GroupDelivery};
pub use group_directory::GroupDirectory;
pub use inbox_store::InboxStore;
pub use incident_store::IncidentStore;
