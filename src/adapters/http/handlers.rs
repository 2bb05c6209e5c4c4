//! HTTP handlers for the dispatch API.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::application::{DispatchService, RosterAction};
use crate::domain::dispatch::{AssignmentStatus, IncidentStatus, ResourceRef, ResourceType};
use crate::domain::foundation::{
    AgencyId, AssignmentId, DispatchError, InboxEntryId, IncidentId, RoleName, StationId, UserId,
};

use super::dto::{
    AddIncidentLogRequest, AssignResourceRequest, AssignmentResponse, CreateIncidentRequest,
    ErrorResponse, GlobalBroadcastRequest, InboxEntryResponse, InboxQuery, IncidentResponse,
    RoleBroadcastRequest, RosterActionDto, RosterChangeRequest, SetAssignmentStatusRequest,
    SetIncidentStatusRequest, UserNoticeRequest,
};

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct DispatchAppState {
    pub service: Arc<DispatchService>,
}

impl DispatchAppState {
    pub fn new(service: Arc<DispatchService>) -> Self {
        Self { service }
    }
}

impl From<RosterActionDto> for RosterAction {
    fn from(dto: RosterActionDto) -> Self {
        match dto {
            RosterActionDto::Created => RosterAction::Created,
            RosterActionDto::Updated => RosterAction::Updated,
            RosterActionDto::Deleted => RosterAction::Deleted,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Incident handlers
// ════════════════════════════════════════════════════════════════════════════

/// POST /api/incidents - Report a new incident
pub async fn create_incident(
    State(state): State<DispatchAppState>,
    Json(req): Json<CreateIncidentRequest>,
) -> Response {
    let reported_by = match UserId::new(req.reported_by) {
        Ok(id) => id,
        Err(e) => return bad_request(e.to_string()),
    };

    let result = state
        .service
        .create_incident(
            req.station_id.and_then(StationId::from_raw),
            req.agency_id.and_then(AgencyId::from_raw),
            req.description,
            reported_by,
        )
        .await;

    match result {
        Ok(incident) => {
            (StatusCode::CREATED, Json(IncidentResponse::from(incident))).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// GET /api/incidents/:id - Fetch one incident
pub async fn get_incident(
    State(state): State<DispatchAppState>,
    Path(id): Path<String>,
) -> Response {
    let incident_id = match id.parse::<IncidentId>() {
        Ok(id) => id,
        Err(_) => return bad_request("Invalid incident ID"),
    };

    match state.service.incident(&incident_id).await {
        Ok(Some(incident)) => (StatusCode::OK, Json(IncidentResponse::from(incident))).into_response(),
        Ok(None) => error_response(DispatchError::not_found("incident", incident_id)),
        Err(e) => error_response(e),
    }
}

/// PATCH /api/incidents/:id/status - Change incident lifecycle status
pub async fn set_incident_status(
    State(state): State<DispatchAppState>,
    Path(id): Path<String>,
    Json(req): Json<SetIncidentStatusRequest>,
) -> Response {
    let incident_id = match id.parse::<IncidentId>() {
        Ok(id) => id,
        Err(_) => return bad_request("Invalid incident ID"),
    };
    let Some(status) = IncidentStatus::parse(&req.status) else {
        return bad_request(format!("Unknown incident status: {}", req.status));
    };

    match state.service.set_incident_status(&incident_id, status).await {
        Ok(incident) => (StatusCode::OK, Json(IncidentResponse::from(incident))).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /api/incidents/:id/log - Announce a new incident log entry
pub async fn add_incident_log(
    State(state): State<DispatchAppState>,
    Path(id): Path<String>,
    Json(req): Json<AddIncidentLogRequest>,
) -> Response {
    let incident_id = match id.parse::<IncidentId>() {
        Ok(id) => id,
        Err(_) => return bad_request("Invalid incident ID"),
    };
    let logged_by = match UserId::new(req.logged_by) {
        Ok(id) => id,
        Err(e) => return bad_request(e.to_string()),
    };

    match state
        .service
        .add_incident_log(&incident_id, req.message, logged_by)
        .await
    {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(e) => error_response(e),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Assignment handlers
// ════════════════════════════════════════════════════════════════════════════

/// POST /api/incidents/:id/assignments - Bind a resource to an incident
pub async fn assign_resource(
    State(state): State<DispatchAppState>,
    Path(id): Path<String>,
    Json(req): Json<AssignResourceRequest>,
) -> Response {
    let incident_id = match id.parse::<IncidentId>() {
        Ok(id) => id,
        Err(_) => return bad_request("Invalid incident ID"),
    };
    let assigned_by = match UserId::new(req.assigned_by) {
        Ok(id) => id,
        Err(e) => return bad_request(e.to_string()),
    };

    let resource = ResourceRef::new(req.resource_type, req.resource_id);
    match state
        .service
        .assign_resource(&incident_id, resource, assigned_by)
        .await
    {
        Ok(assignment) => {
            (StatusCode::CREATED, Json(AssignmentResponse::from(assignment))).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// GET /api/incidents/:id/assignments - List an incident's assignments
pub async fn list_incident_assignments(
    State(state): State<DispatchAppState>,
    Path(id): Path<String>,
) -> Response {
    let incident_id = match id.parse::<IncidentId>() {
        Ok(id) => id,
        Err(_) => return bad_request("Invalid incident ID"),
    };

    match state.service.assignments_for_incident(&incident_id).await {
        Ok(assignments) => {
            let response: Vec<AssignmentResponse> =
                assignments.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// PATCH /api/assignments/:id/status - Move an assignment through its lifecycle
pub async fn set_assignment_status(
    State(state): State<DispatchAppState>,
    Path(id): Path<String>,
    Json(req): Json<SetAssignmentStatusRequest>,
) -> Response {
    let assignment_id = match id.parse::<AssignmentId>() {
        Ok(id) => id,
        Err(_) => return bad_request("Invalid assignment ID"),
    };
    let Some(status) = AssignmentStatus::parse(&req.status) else {
        return bad_request(format!("Unknown assignment status: {}", req.status));
    };
    let changed_by = match UserId::new(req.changed_by) {
        Ok(id) => id,
        Err(e) => return bad_request(e.to_string()),
    };

    match state
        .service
        .set_assignment_status(&assignment_id, status, changed_by)
        .await
    {
        Ok(assignment) => {
            (StatusCode::OK, Json(AssignmentResponse::from(assignment))).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// GET /api/resources/:type/:id/assignment - Active assignment for a resource
pub async fn active_assignment(
    State(state): State<DispatchAppState>,
    Path((resource_type, resource_id)): Path<(String, i64)>,
) -> Response {
    let Some(kind) = ResourceType::parse(&resource_type) else {
        return bad_request(format!("Unknown resource type: {}", resource_type));
    };

    let resource = ResourceRef::new(kind, resource_id);
    match state.service.active_assignment(resource).await {
        Ok(Some(assignment)) => {
            (StatusCode::OK, Json(AssignmentResponse::from(assignment))).into_response()
        }
        Ok(None) => error_response(DispatchError::not_found("assignment", resource)),
        Err(e) => error_response(e),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Roster / broadcast handlers
// ════════════════════════════════════════════════════════════════════════════

/// POST /api/roster/personnel - Fan out a personnel roster change
pub async fn personnel_change(
    State(state): State<DispatchAppState>,
    Json(req): Json<RosterChangeRequest>,
) -> Response {
    state
        .service
        .record_personnel_change(
            req.action.into(),
            req.resource_id,
            req.display_name,
            req.station_id.and_then(StationId::from_raw),
            req.agency_id.and_then(AgencyId::from_raw),
        )
        .await;
    StatusCode::ACCEPTED.into_response()
}

/// POST /api/roster/vehicles - Fan out a vehicle fleet change
pub async fn vehicle_change(
    State(state): State<DispatchAppState>,
    Json(req): Json<RosterChangeRequest>,
) -> Response {
    state
        .service
        .record_vehicle_change(
            req.action.into(),
            req.resource_id,
            req.display_name,
            req.station_id.and_then(StationId::from_raw),
            req.agency_id.and_then(AgencyId::from_raw),
        )
        .await;
    StatusCode::ACCEPTED.into_response()
}

/// POST /api/broadcasts/role - Message every holder of a role
pub async fn role_broadcast(
    State(state): State<DispatchAppState>,
    Json(req): Json<RoleBroadcastRequest>,
) -> Response {
    let role = match RoleName::new(req.role) {
        Ok(role) => role,
        Err(e) => return bad_request(e.to_string()),
    };

    match state
        .service
        .broadcast_to_role(role, req.title, req.message)
        .await
    {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /api/broadcasts/global - Message command-level dashboards
pub async fn global_broadcast(
    State(state): State<DispatchAppState>,
    Json(req): Json<GlobalBroadcastRequest>,
) -> Response {
    match state.service.broadcast_global(req.title, req.message).await {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /api/notices - Send a direct user notice
pub async fn user_notice(
    State(state): State<DispatchAppState>,
    Json(req): Json<UserNoticeRequest>,
) -> Response {
    let user_id = match UserId::new(req.user_id) {
        Ok(id) => id,
        Err(e) => return bad_request(e.to_string()),
    };
    let incident_id = match req.incident_id {
        Some(raw) => match raw.parse::<IncidentId>() {
            Ok(id) => Some(id),
            Err(_) => return bad_request("Invalid incident ID"),
        },
        None => None,
    };

    match state
        .service
        .notify_user(user_id, req.title, req.message, incident_id)
        .await
    {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(e) => error_response(e),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Inbox handlers
// ════════════════════════════════════════════════════════════════════════════

/// GET /api/inbox/:user_id - List a user's inbox
pub async fn list_inbox(
    State(state): State<DispatchAppState>,
    Path(user_id): Path<String>,
    Query(query): Query<InboxQuery>,
) -> Response {
    let user_id = match UserId::new(user_id) {
        Ok(id) => id,
        Err(e) => return bad_request(e.to_string()),
    };

    match state.service.inbox_for(&user_id, query.unread_only).await {
        Ok(entries) => {
            let response: Vec<InboxEntryResponse> = entries.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// POST /api/inbox/entries/:id/read - Mark one entry read
pub async fn mark_entry_read(
    State(state): State<DispatchAppState>,
    Path(id): Path<String>,
) -> Response {
    let entry_id = match id.parse::<InboxEntryId>() {
        Ok(id) => id,
        Err(_) => return bad_request("Invalid inbox entry ID"),
    };

    match state.service.mark_inbox_read(&entry_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /api/inbox/:user_id/read_all - Mark a whole inbox read
pub async fn mark_inbox_read_all(
    State(state): State<DispatchAppState>,
    Path(user_id): Path<String>,
) -> Response {
    let user_id = match UserId::new(user_id) {
        Ok(id) => id,
        Err(e) => return bad_request(e.to_string()),
    };

    match state.service.mark_inbox_all_read(&user_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

/// DELETE /api/inbox/entries/:id - Remove one entry
pub async fn remove_entry(
    State(state): State<DispatchAppState>,
    Path(id): Path<String>,
) -> Response {
    let entry_id = match id.parse::<InboxEntryId>() {
        Ok(id) => id,
        Err(_) => return bad_request("Invalid inbox entry ID"),
    };

    match state.service.remove_inbox_entry(&entry_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

/// DELETE /api/inbox/:user_id - Clear a whole inbox
pub async fn clear_inbox(
    State(state): State<DispatchAppState>,
    Path(user_id): Path<String>,
) -> Response {
    let user_id = match UserId::new(user_id) {
        Ok(id) => id,
        Err(e) => return bad_request(e.to_string()),
    };

    match state.service.clear_inbox(&user_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /health - Liveness probe
pub async fn health() -> Response {
    (StatusCode::OK, "OK").into_response()
}

// ════════════════════════════════════════════════════════════════════════════
// Error mapping
// ════════════════════════════════════════════════════════════════════════════

fn status_for(err: &DispatchError) -> StatusCode {
    match err {
        DispatchError::NotFound { .. } => StatusCode::NOT_FOUND,
        DispatchError::InvalidTransition { .. } => StatusCode::CONFLICT,
        DispatchError::ResourceAlreadyAssigned { .. } => StatusCode::CONFLICT,
        DispatchError::Validation(_) => StatusCode::BAD_REQUEST,
        DispatchError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: DispatchError) -> Response {
    let status = status_for(&err);
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!("request failed: {}", err);
    }
    (status, Json(ErrorResponse::from(&err))).into_response()
}

fn bad_request(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::bad_request(message)),
    )
        .into_response()
}
