//! Application layer: orchestration between domain, stores and fan-out.

pub mod dispatch;
pub mod recorder;

pub use dispatch::{DispatchService, RosterAction};
pub use recorder::{NotificationRecorder, RECORDED_EVENT_KINDS};
