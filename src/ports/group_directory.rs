//! Group directory port.
//!
//! The durable notification recorder needs the *users* behind a group
//! (station roster, agency membership, role holders), not the live
//! connections. That membership data lives in the surrounding
//! application's user store; this port is the seam to it.

use async_trait::async_trait;

use crate::domain::foundation::{DispatchError, UserId};
use crate::domain::routing::GroupKey;

/// Port resolving a group key to the user ids it covers.
#[async_trait]
pub trait GroupDirectory: Send + Sync {
    /// Returns every user belonging to the group.
    ///
    /// `GroupKey::User` resolves to exactly that user; an unknown
    /// station/agency/role resolves to the empty set.
    async fn users_in(&self, group: &GroupKey) -> Result<Vec<UserId>, DispatchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_directory_is_object_safe() {
        fn _accepts_dyn(_dir: &dyn GroupDirectory) {}
    }
}
