//! HTTP adapter exposing dispatch operations over a REST surface.
//!
//! Follows a three-layer split:
//! - `dto` - wire types, decoupled from the domain
//! - `handlers` - request parsing, service calls, error mapping
//! - `routes` - route table
//!
//! Status mapping: lookups that miss return 404, lifecycle conflicts
//! (bad transitions, busy resources) return 409, malformed input 400,
//! storage failures 500. Every error body carries a stable `code` the
//! frontends can switch on.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::DispatchAppState;
pub use routes::dispatch_routes;
