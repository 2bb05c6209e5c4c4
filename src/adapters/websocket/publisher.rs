//! Best-effort event fan-out over the connection registry.
//!
//! One publish resolves each target group to its current members and
//! `try_send`s the wire message into every member's queue. A full queue
//! drops the message for that connection only; a closed queue marks the
//! connection dead and it is swept from the registry before returning.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::dispatch::DispatchEvent;
use crate::domain::foundation::ConnectionId;
use crate::ports::{DeliveryReport, EventFanout, GroupDelivery};

use super::messages::{EventMessage, ServerMessage};
use super::registry::ConnectionRegistry;

/// [`EventFanout`] backed by the in-process connection registry.
pub struct FanoutPublisher {
    registry: Arc<ConnectionRegistry>,
}

impl FanoutPublisher {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl EventFanout for FanoutPublisher {
    async fn publish(&self, event: &DispatchEvent) -> DeliveryReport {
        let message = ServerMessage::Event(EventMessage::from_event(event));
        let mut report = DeliveryReport::default();
        let mut dead: Vec<ConnectionId> = Vec::new();

        for group in &event.targets {
            let members = self.registry.members_of(group).await;
            let mut delivery = GroupDelivery {
                group: group.clone(),
                attempted: members.len(),
                delivered: 0,
                failed: 0,
            };

            for handle in members {
                match handle.sender.try_send(message.clone()) {
                    Ok(()) => delivery.delivered += 1,
                    Err(tokio::sync::mpsc::error::TrySendError::Full(_)) => {
                        delivery.failed += 1;
                        tracing::warn!(
                            connection_id = %handle.id,
                            group = %group,
                            event = %event.kind,
                            "outbound queue full, dropping event for this connection"
                        );
                    }
                    Err(tokio::sync::mpsc::error::TrySendError::Closed(_)) => {
                        delivery.failed += 1;
                        dead.push(handle.id);
                    }
                }
            }

            report.groups.push(delivery);
        }

        for id in dead {
            tracing::debug!(connection_id = %id, "sweeping closed connection");
            self.registry.unregister(&id).await;
        }

        if report.reached_nobody() {
            tracing::info!(
                event = %event.kind,
                event_id = %event.event_id,
                "event reached no live connections"
            );
        } else {
            tracing::debug!(
                event = %event.kind,
                event_id = %event.event_id,
                attempted = report.total_attempted(),
                delivered = report.total_delivered(),
                failed = report.total_failed(),
                "event fanned out"
            );
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::websocket::registry::ClientIdentity;
    use crate::domain::dispatch::EventKind;
    use crate::domain::foundation::{AgencyId, StationId, UserId};
    use crate::domain::routing::EventScope;
    use serde_json::json;

    fn station_member(user: &str, station: i64) -> ClientIdentity {
        ClientIdentity {
            user_id: UserId::new(user).unwrap(),
            station: StationId::from_raw(station),
            agency: None,
            roles: Vec::new(),
        }
    }

    // Targets station 7 and agency 3.
    fn status_event() -> DispatchEvent {
        DispatchEvent::new(
            EventKind::AssignmentStatusChanged,
            &EventScope::incident(StationId::from_raw(7), AgencyId::from_raw(3)),
            json!({"assignmentId": "a-1"}),
        )
    }

    #[tokio::test]
    async fn delivers_to_station_members_only() {
        let registry = Arc::new(ConnectionRegistry::with_default_capacity());
        let (_h1, mut rx_in) = registry.register(&station_member("u-1", 7)).await;
        let (_h2, mut rx_out) = registry.register(&station_member("u-2", 9)).await;
        let publisher = FanoutPublisher::new(registry);

        let report = publisher.publish(&status_event()).await;

        assert_eq!(report.total_delivered(), 1);
        assert!(matches!(rx_in.recv().await, Some(ServerMessage::Event(_))));
        assert!(rx_out.try_recv().is_err());
    }

    #[tokio::test]
    async fn full_queue_drops_without_blocking_others() {
        let registry = Arc::new(ConnectionRegistry::new(1));
        let (_slow, _rx_slow) = registry.register(&station_member("slow", 7)).await;
        let (_fast, mut rx_fast) = registry.register(&station_member("fast", 7)).await;
        let publisher = FanoutPublisher::new(registry);

        // First publish fills both 1-slot queues; the slow client never drains.
        publisher.publish(&status_event()).await;
        let _ = rx_fast.recv().await;

        let report = publisher.publish(&status_event()).await;

        assert_eq!(report.total_failed(), 1);
        assert_eq!(report.total_delivered(), 1);
        assert!(matches!(rx_fast.recv().await, Some(ServerMessage::Event(_))));
    }

    #[tokio::test]
    async fn closed_connection_is_swept_from_registry() {
        let registry = Arc::new(ConnectionRegistry::with_default_capacity());
        let (_h, rx) = registry.register(&station_member("gone", 7)).await;
        drop(rx);
        let publisher = FanoutPublisher::new(registry.clone());

        let report = publisher.publish(&status_event()).await;

        assert_eq!(report.total_failed(), 1);
        assert_eq!(registry.connection_count().await, 0);
    }

    #[tokio::test]
    async fn event_with_no_listeners_reports_nobody() {
        let registry = Arc::new(ConnectionRegistry::with_default_capacity());
        let publisher = FanoutPublisher::new(registry);

        let report = publisher.publish(&status_event()).await;

        assert!(report.reached_nobody());
        // One entry per target group, all empty.
        assert_eq!(report.groups.len(), 2);
    }

    #[tokio::test]
    async fn member_of_two_matching_groups_gets_event_per_group() {
        let registry = Arc::new(ConnectionRegistry::with_default_capacity());
        let both = ClientIdentity {
            user_id: UserId::new("u-1").unwrap(),
            station: StationId::from_raw(7),
            agency: AgencyId::from_raw(3),
            roles: Vec::new(),
        };
        let (_h, mut rx) = registry.register(&both).await;
        let publisher = FanoutPublisher::new(registry);

        let report = publisher.publish(&status_event()).await;

        // Station and agency each deliver once; the client dedupes by event id.
        assert_eq!(report.total_delivered(), 2);
        let first = rx.recv().await;
        let second = rx.recv().await;
        match (first, second) {
            (Some(ServerMessage::Event(a)), Some(ServerMessage::Event(b))) => {
                assert_eq!(a.event_id, b.event_id);
            }
            other => panic!("expected two event pushes, got {:?}", other),
        }
    }
}
