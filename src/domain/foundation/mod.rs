//! Shared value objects and base traits for the dispatch domain.

mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::{DispatchError, ValidationError};
pub use ids::{
    AgencyId, AssignmentId, ConnectionId, EventId, InboxEntryId, IncidentId, RoleName, StationId,
    UserId,
};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
