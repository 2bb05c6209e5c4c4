//! Durable notification types.

mod inbox;

pub use inbox::InboxEntry;
