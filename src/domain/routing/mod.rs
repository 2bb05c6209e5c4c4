//! Event routing: typed group keys and the group router.

mod group;
mod router;

pub use group::GroupKey;
pub use router::{resolve_targets, EventScope};
