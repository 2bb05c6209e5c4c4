//! Dispatch Hub - Real-time emergency dispatch notification core
//!
//! This crate keeps field crews and dispatch dashboards synchronized:
//! incidents, resource assignments, roster changes, and broadcasts fan
//! out over WebSocket to scoped delivery groups, and a durable inbox
//! records the notifications a user must not miss.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
