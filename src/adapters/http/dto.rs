//! HTTP DTOs for the dispatch API.
//!
//! These types decouple the HTTP surface from domain types.

use serde::{Deserialize, Serialize};

use crate::domain::dispatch::{
    Assignment, AssignmentStatus, Incident, IncidentStatus, ResourceType,
};
use crate::domain::foundation::DispatchError;
use crate::domain::notification::InboxEntry;

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Request to report a new incident.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIncidentRequest {
    #[serde(default)]
    pub station_id: Option<i64>,
    #[serde(default)]
    pub agency_id: Option<i64>,
    pub description: String,
    pub reported_by: String,
}

/// Request to change an incident's status.
#[derive(Debug, Clone, Deserialize)]
pub struct SetIncidentStatusRequest {
    pub status: String,
}

/// Request to announce a new incident log entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddIncidentLogRequest {
    pub message: String,
    pub logged_by: String,
}

/// Request to bind a resource to an incident.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignResourceRequest {
    pub resource_type: ResourceType,
    pub resource_id: i64,
    pub assigned_by: String,
}

/// Request to move an assignment through its lifecycle.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetAssignmentStatusRequest {
    pub status: String,
    pub changed_by: String,
}

/// Request to fan out a roster or fleet change.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterChangeRequest {
    pub action: RosterActionDto,
    pub resource_id: i64,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub station_id: Option<i64>,
    #[serde(default)]
    pub agency_id: Option<i64>,
}

/// Wire form of a roster action.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RosterActionDto {
    Created,
    Updated,
    Deleted,
}

/// Request for a role-scoped broadcast.
#[derive(Debug, Clone, Deserialize)]
pub struct RoleBroadcastRequest {
    pub role: String,
    pub title: String,
    pub message: String,
}

/// Request for a global broadcast.
#[derive(Debug, Clone, Deserialize)]
pub struct GlobalBroadcastRequest {
    pub title: String,
    pub message: String,
}

/// Request for a direct user notice.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserNoticeRequest {
    pub user_id: String,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub incident_id: Option<String>,
}

/// Query parameters for listing an inbox.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxQuery {
    #[serde(default)]
    pub unread_only: bool,
}

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Incident view for API responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentResponse {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub station_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agency_id: Option<i64>,
    pub description: String,
    pub status: IncidentStatus,
    pub reported_by: String,
    pub created_at: String,
}

impl From<Incident> for IncidentResponse {
    fn from(incident: Incident) -> Self {
        Self {
            id: incident.id().to_string(),
            station_id: incident.station().map(|s| s.value()),
            agency_id: incident.agency().map(|a| a.value()),
            description: incident.description().to_string(),
            status: incident.status(),
            reported_by: incident.reported_by().to_string(),
            created_at: incident.created_at().to_rfc3339(),
        }
    }
}

/// Assignment view for API responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentResponse {
    pub id: String,
    pub incident_id: String,
    pub resource_type: ResourceType,
    pub resource_id: i64,
    pub status: AssignmentStatus,
    pub assigned_by: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Assignment> for AssignmentResponse {
    fn from(assignment: Assignment) -> Self {
        let resource = assignment.resource();
        Self {
            id: assignment.id().to_string(),
            incident_id: assignment.incident_id().to_string(),
            resource_type: resource.kind,
            resource_id: resource.id,
            status: assignment.status(),
            assigned_by: assignment.assigned_by().to_string(),
            created_at: assignment.created_at().to_rfc3339(),
            updated_at: assignment.updated_at().to_rfc3339(),
        }
    }
}

/// Inbox entry view for API responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxEntryResponse {
    pub id: String,
    pub event: String,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident_id: Option<String>,
    pub is_read: bool,
    pub created_at: String,
}

impl From<InboxEntry> for InboxEntryResponse {
    fn from(entry: InboxEntry) -> Self {
        Self {
            id: entry.id().to_string(),
            event: entry.event_kind().as_str().to_string(),
            title: entry.title().to_string(),
            message: entry.message().to_string(),
            incident_id: entry.incident_id().map(|id| id.to_string()),
            is_read: entry.is_read(),
            created_at: entry.created_at().to_rfc3339(),
        }
    }
}

/// Error body returned for every failed request.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: "VALIDATION_FAILED".to_string(),
            message: message.into(),
        }
    }
}

impl From<&DispatchError> for ErrorResponse {
    fn from(err: &DispatchError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dispatch::ResourceRef;
    use crate::domain::foundation::{IncidentId, UserId};

    #[test]
    fn assignment_response_uses_camel_case() {
        let assignment = Assignment::create(
            IncidentId::new(),
            ResourceRef::vehicle(7),
            UserId::new("d-1").unwrap(),
        );
        let response: AssignmentResponse = assignment.into();
        let value = serde_json::to_value(&response).unwrap();

        assert!(value.get("incidentId").is_some());
        assert_eq!(value["resourceType"], "vehicle");
        assert_eq!(value["status"], "notified");
    }

    #[test]
    fn error_response_carries_stable_code() {
        let err = DispatchError::not_found("incident", "i-1");
        let response: ErrorResponse = (&err).into();
        assert_eq!(response.code, "NOT_FOUND");
    }
}
