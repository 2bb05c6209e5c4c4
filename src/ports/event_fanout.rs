//! Event fan-out port.
//!
//! Delivery is best effort: `publish` never fails and never blocks on a
//! slow consumer. The returned [`DeliveryReport`] is observability data,
//! not a contract — callers log it and move on. Durable notification is
//! the recorder's job, not the fan-out's.

use async_trait::async_trait;

use crate::domain::dispatch::DispatchEvent;
use crate::domain::routing::GroupKey;

/// Per-group delivery counts for one published event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupDelivery {
    pub group: GroupKey,
    /// Connections the group resolved to at publish time.
    pub attempted: usize,
    /// Sends that were accepted by the connection's queue.
    pub delivered: usize,
    /// Sends dropped because the queue was full or closed.
    pub failed: usize,
}

/// Outcome of fanning one event out to its target groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub groups: Vec<GroupDelivery>,
}

impl DeliveryReport {
    pub fn total_attempted(&self) -> usize {
        self.groups.iter().map(|g| g.attempted).sum()
    }

    pub fn total_delivered(&self) -> usize {
        self.groups.iter().map(|g| g.delivered).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.groups.iter().map(|g| g.failed).sum()
    }

    /// True when no target group resolved to any connection. Worth a log
    /// line for audit-relevant events, nothing more.
    pub fn reached_nobody(&self) -> bool {
        self.total_attempted() == 0
    }
}

/// Port pushing events to live subscribers.
#[async_trait]
pub trait EventFanout: Send + Sync {
    /// Delivers `event` to every connection in its target groups.
    ///
    /// A connection subscribed through several matching groups receives
    /// the event once per group; receivers deduplicate by event id.
    async fn publish(&self, event: &DispatchEvent) -> DeliveryReport;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::StationId;

    #[test]
    fn event_fanout_is_object_safe() {
        fn _accepts_dyn(_fanout: &dyn EventFanout) {}
    }

    #[test]
    fn report_totals_sum_across_groups() {
        let report = DeliveryReport {
            groups: vec![
                GroupDelivery {
                    group: GroupKey::Station(StationId::new(1).unwrap()),
                    attempted: 3,
                    delivered: 2,
                    failed: 1,
                },
                GroupDelivery {
                    group: GroupKey::Global,
                    attempted: 2,
                    delivered: 2,
                    failed: 0,
                },
            ],
        };

        assert_eq!(report.total_attempted(), 5);
        assert_eq!(report.total_delivered(), 4);
        assert_eq!(report.total_failed(), 1);
        assert!(!report.reached_nobody());
    }

    #[test]
    fn empty_report_reached_nobody() {
        assert!(DeliveryReport::default().reached_nobody());
    }
}
