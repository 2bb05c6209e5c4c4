//! PostgreSQL implementation of AssignmentStore.
//!
//! The one-active-assignment-per-resource rule is backed by a partial
//! unique index (`assignments_one_active_per_resource`) so it holds even
//! against writers outside this process; a violation maps to
//! `ResourceAlreadyAssigned` instead of a generic storage error.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::dispatch::{Assignment, AssignmentStatus, ResourceRef, ResourceType};
use crate::domain::foundation::{
    AssignmentId, DispatchError, IncidentId, Timestamp, UserId,
};
use crate::ports::AssignmentStore;

/// Name of the partial unique index enforcing resource exclusivity.
const EXCLUSIVITY_INDEX: &str = "assignments_one_active_per_resource";

/// PostgreSQL implementation of AssignmentStore.
#[derive(Clone)]
pub struct PostgresAssignmentStore {
    pool: PgPool,
}

impl PostgresAssignmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssignmentStore for PostgresAssignmentStore {
    async fn insert(&self, assignment: &Assignment) -> Result<(), DispatchError> {
        let resource = assignment.resource();
        sqlx::query(
            r#"
            INSERT INTO assignments (
                id, incident_id, resource_type, resource_id, status,
                assigned_by, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(assignment.id().as_uuid())
        .bind(assignment.incident_id().as_uuid())
        .bind(resource.kind.as_str())
        .bind(resource.id)
        .bind(assignment.status().as_str())
        .bind(assignment.assigned_by().as_str())
        .bind(assignment.created_at().as_datetime())
        .bind(assignment.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_exclusivity_violation(&e) {
                DispatchError::already_assigned(resource.kind.as_str(), resource.id)
            } else {
                DispatchError::Database(format!("Failed to insert assignment: {}", e))
            }
        })?;

        Ok(())
    }

    async fn update(&self, assignment: &Assignment) -> Result<(), DispatchError> {
        let result = sqlx::query(
            r#"
            UPDATE assignments SET
                status = $2,
                updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(assignment.id().as_uuid())
        .bind(assignment.status().as_str())
        .bind(assignment.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_exclusivity_violation(&e) {
                let resource = assignment.resource();
                DispatchError::already_assigned(resource.kind.as_str(), resource.id)
            } else {
                DispatchError::Database(format!("Failed to update assignment: {}", e))
            }
        })?;

        if result.rows_affected() == 0 {
            return Err(DispatchError::not_found("assignment", assignment.id()));
        }

        Ok(())
    }

    async fn find_by_id(&self, id: &AssignmentId) -> Result<Option<Assignment>, DispatchError> {
        let row = sqlx::query(
            r#"
            SELECT id, incident_id, resource_type, resource_id, status,
                   assigned_by, created_at, updated_at
            FROM assignments
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DispatchError::Database(format!("Failed to fetch assignment: {}", e)))?;

        row.map(row_to_assignment).transpose()
    }

    async fn active_for_resource(
        &self,
        resource: ResourceRef,
    ) -> Result<Option<Assignment>, DispatchError> {
        let row = sqlx::query(
            r#"
            SELECT id, incident_id, resource_type, resource_id, status,
                   assigned_by, created_at, updated_at
            FROM assignments
            WHERE resource_type = $1
              AND resource_id = $2
              AND status IN ('notified', 'on_scene')
            "#,
        )
        .bind(resource.kind.as_str())
        .bind(resource.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DispatchError::Database(format!("Failed to fetch active assignment: {}", e))
        })?;

        row.map(row_to_assignment).transpose()
    }

    async fn for_incident(
        &self,
        incident_id: &IncidentId,
    ) -> Result<Vec<Assignment>, DispatchError> {
        let rows = sqlx::query(
            r#"
            SELECT id, incident_id, resource_type, resource_id, status,
                   assigned_by, created_at, updated_at
            FROM assignments
            WHERE incident_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(incident_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DispatchError::Database(format!("Failed to fetch incident assignments: {}", e))
        })?;

        rows.into_iter().map(row_to_assignment).collect()
    }
}

fn is_exclusivity_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|db| db.constraint())
        .map(|name| name == EXCLUSIVITY_INDEX)
        .unwrap_or(false)
}

fn row_to_assignment(row: sqlx::postgres::PgRow) -> Result<Assignment, DispatchError> {
    let id: uuid::Uuid = row
        .try_get("id")
        .map_err(|e| DispatchError::Database(format!("Failed to get id: {}", e)))?;

    let incident_id: uuid::Uuid = row
        .try_get("incident_id")
        .map_err(|e| DispatchError::Database(format!("Failed to get incident_id: {}", e)))?;

    let resource_type: String = row
        .try_get("resource_type")
        .map_err(|e| DispatchError::Database(format!("Failed to get resource_type: {}", e)))?;
    let kind = ResourceType::parse(&resource_type)
        .ok_or_else(|| DispatchError::Database(format!("Invalid resource type: {}", resource_type)))?;

    let resource_id: i64 = row
        .try_get("resource_id")
        .map_err(|e| DispatchError::Database(format!("Failed to get resource_id: {}", e)))?;

    let status_str: String = row
        .try_get("status")
        .map_err(|e| DispatchError::Database(format!("Failed to get status: {}", e)))?;
    let status = AssignmentStatus::parse(&status_str)
        .ok_or_else(|| DispatchError::Database(format!("Invalid assignment status: {}", status_str)))?;

    let assigned_by: String = row
        .try_get("assigned_by")
        .map_err(|e| DispatchError::Database(format!("Failed to get assigned_by: {}", e)))?;

    let created_at: chrono::DateTime<chrono::Utc> = row
        .try_get("created_at")
        .map_err(|e| DispatchError::Database(format!("Failed to get created_at: {}", e)))?;

    let updated_at: chrono::DateTime<chrono::Utc> = row
        .try_get("updated_at")
        .map_err(|e| DispatchError::Database(format!("Failed to get updated_at: {}", e)))?;

    Ok(Assignment::from_parts(
        AssignmentId::from_uuid(id),
        IncidentId::from_uuid(incident_id),
        ResourceRef::new(kind, resource_id),
        status,
        UserId::new(assigned_by)
            .map_err(|e| DispatchError::Database(format!("Invalid assigned_by: {}", e)))?,
        Timestamp::from_datetime(created_at),
        Timestamp::from_datetime(updated_at),
    ))
}
