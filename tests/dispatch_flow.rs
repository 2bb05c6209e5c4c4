//! End-to-end tests for the dispatch notification flow.
//!
//! These tests wire the real application service to the in-memory
//! adapters and the live fan-out layer, covering:
//! 1. Incident creation reaching a station dashboard over the registry
//! 2. Resource exclusivity under racing assignment requests
//! 3. Reassignment after an assignment reaches a terminal status
//! 4. Disconnect cleanup stopping delivery
//! 5. Durable inbox recording alongside the live push

use std::sync::Arc;

use dispatch_hub::adapters::memory::{
    InMemoryAssignmentStore, InMemoryGroupDirectory, InMemoryIncidentStore, InMemoryInboxStore,
};
use dispatch_hub::adapters::websocket::{
    ClientIdentity, ConnectionRegistry, FanoutPublisher, ServerMessage,
};
use dispatch_hub::application::{DispatchService, NotificationRecorder};
use dispatch_hub::domain::dispatch::{AssignmentStatus, IncidentStatus, ResourceRef};
use dispatch_hub::domain::foundation::{AgencyId, DispatchError, RoleName, StationId, UserId};
use dispatch_hub::domain::routing::GroupKey;
use dispatch_hub::ports::GroupDirectory;

// =============================================================================
// Test Infrastructure
// =============================================================================

struct TestHarness {
    service: Arc<DispatchService>,
    registry: Arc<ConnectionRegistry>,
    directory: Arc<InMemoryGroupDirectory>,
}

fn harness() -> TestHarness {
    let registry = Arc::new(ConnectionRegistry::with_default_capacity());
    let publisher = Arc::new(FanoutPublisher::new(Arc::clone(&registry)));
    let directory = Arc::new(InMemoryGroupDirectory::new());
    let recorder = Arc::new(NotificationRecorder::new(
        Arc::clone(&directory) as Arc<dyn GroupDirectory>,
        Arc::new(InMemoryInboxStore::new()),
    ));
    let service = Arc::new(DispatchService::new(
        Arc::new(InMemoryIncidentStore::new()),
        Arc::new(InMemoryAssignmentStore::new()),
        publisher,
        recorder,
    ));
    TestHarness {
        service,
        registry,
        directory,
    }
}

fn station(id: i64) -> StationId {
    StationId::new(id).unwrap()
}

fn agency(id: i64) -> AgencyId {
    AgencyId::new(id).unwrap()
}

fn user(id: &str) -> UserId {
    UserId::new(id).unwrap()
}

fn station_member(station_id: i64, user_id: &str) -> ClientIdentity {
    ClientIdentity {
        user_id: user(user_id),
        station: Some(station(station_id)),
        agency: None,
        roles: vec![],
    }
}

fn next_event(rx: &mut tokio::sync::mpsc::Receiver<ServerMessage>) -> Option<(String, String)> {
    match rx.try_recv() {
        Ok(ServerMessage::Event(msg)) => Some((msg.event, msg.event_id.to_string())),
        _ => None,
    }
}

// =============================================================================
// Live fan-out
// =============================================================================

#[tokio::test]
async fn incident_creation_reaches_station_dashboard() {
    let h = harness();
    let (_handle, mut rx) = h.registry.register(&station_member(7, "crew-1")).await;

    h.service
        .create_incident(
            Some(station(7)),
            Some(agency(3)),
            "structure fire, Hauptstrasse 12".to_string(),
            user("dispatcher-1"),
        )
        .await
        .unwrap();

    let (event, _) = next_event(&mut rx).expect("station member should receive the event");
    assert_eq!(event, "incident.created");
}

#[tokio::test]
async fn incident_creation_skips_other_stations() {
    let h = harness();
    let (_handle, mut rx) = h.registry.register(&station_member(9, "crew-9")).await;

    h.service
        .create_incident(
            Some(station(7)),
            None,
            "medical emergency".to_string(),
            user("dispatcher-1"),
        )
        .await
        .unwrap();

    assert!(next_event(&mut rx).is_none());
}

#[tokio::test]
async fn status_change_fans_out_to_station_and_agency() {
    let h = harness();
    let (_s, mut station_rx) = h.registry.register(&station_member(7, "crew-1")).await;
    let (_a, mut agency_rx) = h
        .registry
        .register(&ClientIdentity {
            user_id: user("ops-1"),
            station: None,
            agency: Some(agency(3)),
            roles: vec![],
        })
        .await;

    let incident = h
        .service
        .create_incident(
            Some(station(7)),
            Some(agency(3)),
            "flooding".to_string(),
            user("dispatcher-1"),
        )
        .await
        .unwrap();
    // Drain the create push on the station side; the agency only hears
    // about status churn.
    let _ = next_event(&mut station_rx);

    h.service
        .set_incident_status(&incident.id(), IncidentStatus::Closed)
        .await
        .unwrap();

    let (station_event, station_eid) = next_event(&mut station_rx).unwrap();
    let (agency_event, agency_eid) = next_event(&mut agency_rx).unwrap();
    assert_eq!(station_event, "incident.status_changed");
    assert_eq!(agency_event, "incident.status_changed");
    // Same push on both sides; clients deduplicate by event id.
    assert_eq!(station_eid, agency_eid);
}

#[tokio::test]
async fn role_broadcast_reaches_role_holders_only() {
    let h = harness();
    let (_d, mut dispatcher_rx) = h
        .registry
        .register(&ClientIdentity {
            user_id: user("d-1"),
            station: None,
            agency: None,
            roles: vec![RoleName::new("dispatcher").unwrap()],
        })
        .await;
    let (_c, mut crew_rx) = h.registry.register(&station_member(7, "crew-1")).await;

    h.service
        .broadcast_to_role(
            RoleName::new("dispatcher").unwrap(),
            "Shift change".to_string(),
            "Night shift takes over at 22:00".to_string(),
        )
        .await
        .unwrap();

    assert_eq!(
        next_event(&mut dispatcher_rx).unwrap().0,
        "broadcast.role"
    );
    assert!(next_event(&mut crew_rx).is_none());
}

#[tokio::test]
async fn disconnected_client_receives_nothing() {
    let h = harness();
    let (handle, rx) = h.registry.register(&station_member(7, "crew-1")).await;
    drop(rx);
    h.registry.unregister(&handle.id).await;

    h.service
        .create_incident(
            Some(station(7)),
            None,
            "chimney fire".to_string(),
            user("dispatcher-1"),
        )
        .await
        .unwrap();

    let group = GroupKey::Station(station(7));
    assert_eq!(h.registry.group_size(&group).await, 0);
}

// =============================================================================
// Resource exclusivity
// =============================================================================

#[tokio::test]
async fn racing_assignments_grant_the_resource_exactly_once() {
    let h = harness();
    let service = Arc::clone(&h.service);

    let incident_a = service
        .create_incident(Some(station(7)), None, "fire".to_string(), user("d-1"))
        .await
        .unwrap();
    let incident_b = service
        .create_incident(Some(station(9)), None, "crash".to_string(), user("d-2"))
        .await
        .unwrap();

    let s1 = Arc::clone(&service);
    let s2 = Arc::clone(&service);
    let id_a = incident_a.id();
    let id_b = incident_b.id();
    let (first, second) = tokio::join!(
        tokio::spawn(async move {
            s1.assign_resource(&id_a, ResourceRef::vehicle(42), user("d-1"))
                .await
        }),
        tokio::spawn(async move {
            s2.assign_resource(&id_b, ResourceRef::vehicle(42), user("d-2"))
                .await
        }),
    );

    let results = [first.unwrap(), second.unwrap()];
    let granted = results.iter().filter(|r| r.is_ok()).count();
    let rejected = results
        .iter()
        .filter(|r| {
            matches!(
                r,
                Err(DispatchError::ResourceAlreadyAssigned { .. })
            )
        })
        .count();
    assert_eq!(granted, 1, "exactly one request wins the resource");
    assert_eq!(rejected, 1, "the loser sees the busy-resource error");
}

#[tokio::test]
async fn finished_assignment_frees_the_resource() {
    let h = harness();

    let incident_a = h
        .service
        .create_incident(Some(station(7)), None, "fire".to_string(), user("d-1"))
        .await
        .unwrap();
    let assignment = h
        .service
        .assign_resource(&incident_a.id(), ResourceRef::vehicle(42), user("d-1"))
        .await
        .unwrap();

    h.service
        .set_assignment_status(&assignment.id(), AssignmentStatus::OnScene, user("crew-1"))
        .await
        .unwrap();
    h.service
        .set_assignment_status(&assignment.id(), AssignmentStatus::Finished, user("crew-1"))
        .await
        .unwrap();

    // The vehicle is free again.
    assert!(h
        .service
        .active_assignment(ResourceRef::vehicle(42))
        .await
        .unwrap()
        .is_none());

    let incident_b = h
        .service
        .create_incident(Some(station(9)), None, "crash".to_string(), user("d-2"))
        .await
        .unwrap();
    let second = h
        .service
        .assign_resource(&incident_b.id(), ResourceRef::vehicle(42), user("d-2"))
        .await
        .unwrap();
    assert_eq!(second.incident_id(), incident_b.id());
}

#[tokio::test]
async fn unavailable_resource_stays_assignable_elsewhere() {
    let h = harness();

    let incident = h
        .service
        .create_incident(Some(station(7)), None, "fire".to_string(), user("d-1"))
        .await
        .unwrap();
    let assignment = h
        .service
        .assign_resource(&incident.id(), ResourceRef::personnel(5), user("d-1"))
        .await
        .unwrap();

    h.service
        .set_assignment_status(&assignment.id(), AssignmentStatus::Unavailable, user("p-5"))
        .await
        .unwrap();

    // Declining terminates the assignment; the person is not blocked.
    assert!(h
        .service
        .assign_resource(&incident.id(), ResourceRef::personnel(5), user("d-1"))
        .await
        .is_ok());
}

// =============================================================================
// Durable inbox
// =============================================================================

#[tokio::test]
async fn incident_creation_lands_in_station_member_inboxes() {
    let h = harness();
    let group = GroupKey::Station(station(7));
    h.directory.add_member(group.clone(), user("crew-1"));
    h.directory.add_member(group, user("crew-2"));

    h.service
        .create_incident(
            Some(station(7)),
            None,
            "barn fire".to_string(),
            user("dispatcher-1"),
        )
        .await
        .unwrap();

    for member in ["crew-1", "crew-2"] {
        let entries = h.service.inbox_for(&user(member), false).await.unwrap();
        assert_eq!(entries.len(), 1, "{} should have one entry", member);
        assert!(!entries[0].is_read());
    }
}

#[tokio::test]
async fn status_churn_is_not_recorded_in_inboxes() {
    let h = harness();
    h.directory
        .add_member(GroupKey::Station(station(7)), user("crew-1"));

    let incident = h
        .service
        .create_incident(Some(station(7)), None, "fire".to_string(), user("d-1"))
        .await
        .unwrap();
    h.service
        .set_incident_status(&incident.id(), IncidentStatus::Closed)
        .await
        .unwrap();

    // Only the create is durable; the close is a dashboard-only push.
    let entries = h.service.inbox_for(&user("crew-1"), false).await.unwrap();
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn user_in_station_and_agency_gets_one_entry_per_event() {
    let h = harness();
    h.directory
        .add_member(GroupKey::Station(station(7)), user("chief-1"));
    h.directory
        .add_member(GroupKey::Agency(agency(3)), user("chief-1"));

    let incident = h
        .service
        .create_incident(
            Some(station(7)),
            Some(agency(3)),
            "fire".to_string(),
            user("d-1"),
        )
        .await
        .unwrap();
    h.service
        .assign_resource(&incident.id(), ResourceRef::vehicle(42), user("d-1"))
        .await
        .unwrap();

    // Create + assignment, each recorded once despite dual membership.
    let entries = h.service.inbox_for(&user("chief-1"), false).await.unwrap();
    assert_eq!(entries.len(), 2);
}

#[tokio::test]
async fn read_and_clear_lifecycle() {
    let h = harness();
    h.directory
        .add_member(GroupKey::Station(station(7)), user("crew-1"));

    h.service
        .create_incident(Some(station(7)), None, "fire".to_string(), user("d-1"))
        .await
        .unwrap();
    h.service
        .notify_user(
            user("crew-1"),
            "Training".to_string(),
            "Ladder drill on Saturday".to_string(),
            None,
        )
        .await
        .unwrap();

    let entries = h.service.inbox_for(&user("crew-1"), false).await.unwrap();
    assert_eq!(entries.len(), 2);

    h.service.mark_inbox_read(&entries[0].id()).await.unwrap();
    let unread = h.service.inbox_for(&user("crew-1"), true).await.unwrap();
    assert_eq!(unread.len(), 1);

    h.service.mark_inbox_all_read(&user("crew-1")).await.unwrap();
    assert!(h
        .service
        .inbox_for(&user("crew-1"), true)
        .await
        .unwrap()
        .is_empty());

    h.service.clear_inbox(&user("crew-1")).await.unwrap();
    assert!(h
        .service
        .inbox_for(&user("crew-1"), false)
        .await
        .unwrap()
        .is_empty());
}
