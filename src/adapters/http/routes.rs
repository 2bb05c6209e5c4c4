//! Route definitions for the dispatch API.

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use super::handlers::{
    self, DispatchAppState,
};

/// Builds the dispatch API router.
///
/// All routes live under `/api` except the bare `/health` probe.
pub fn dispatch_routes(state: DispatchAppState) -> Router {
    Router::new()
        // Incidents
        .route("/api/incidents", post(handlers::create_incident))
        .route("/api/incidents/:id", get(handlers::get_incident))
        .route(
            "/api/incidents/:id/status",
            patch(handlers::set_incident_status),
        )
        .route("/api/incidents/:id/log", post(handlers::add_incident_log))
        // Assignments
        .route(
            "/api/incidents/:id/assignments",
            post(handlers::assign_resource).get(handlers::list_incident_assignments),
        )
        .route(
            "/api/assignments/:id/status",
            patch(handlers::set_assignment_status),
        )
        .route(
            "/api/resources/:type/:id/assignment",
            get(handlers::active_assignment),
        )
        // Roster and broadcasts
        .route("/api/roster/personnel", post(handlers::personnel_change))
        .route("/api/roster/vehicles", post(handlers::vehicle_change))
        .route("/api/broadcasts/role", post(handlers::role_broadcast))
        .route("/api/broadcasts/global", post(handlers::global_broadcast))
        .route("/api/notices", post(handlers::user_notice))
        // Inbox
        .route(
            "/api/inbox/:user_id",
            get(handlers::list_inbox).delete(handlers::clear_inbox),
        )
        .route(
            "/api/inbox/:user_id/read_all",
            post(handlers::mark_inbox_read_all),
        )
        .route(
            "/api/inbox/entries/:id/read",
            post(handlers::mark_entry_read),
        )
        .route("/api/inbox/entries/:id", delete(handlers::remove_entry))
        // Probes
        .route("/health", get(handlers::health))
        .with_state(state)
}
