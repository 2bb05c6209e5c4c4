//! Domain layer: value objects, aggregates, events, routing and the
//! client-side reconciler. No I/O lives here.

pub mod dispatch;
pub mod foundation;
pub mod notification;
pub mod reconcile;
pub mod routing;
