//! PostgreSQL implementation of IncidentStore.
//!
//! Station and agency ids are stored as plain bigints with `0` meaning
//! "not dispatched yet"; `from_raw` normalizes that sentinel on read.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::dispatch::{Incident, IncidentStatus};
use crate::domain::foundation::{AgencyId, DispatchError, IncidentId, StationId, Timestamp, UserId};
use crate::ports::IncidentStore;

/// PostgreSQL implementation of IncidentStore.
#[derive(Clone)]
pub struct PostgresIncidentStore {
    pool: PgPool,
}

impl PostgresIncidentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IncidentStore for PostgresIncidentStore {
    async fn save(&self, incident: &Incident) -> Result<(), DispatchError> {
        sqlx::query(
            r#"
            INSERT INTO incidents (
                id, station_id, agency_id, description, status, reported_by, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(incident.id().as_uuid())
        .bind(incident.station().map(|s| s.value()).unwrap_or(0))
        .bind(incident.agency().map(|a| a.value()).unwrap_or(0))
        .bind(incident.description())
        .bind(incident.status().as_str())
        .bind(incident.reported_by().as_str())
        .bind(incident.created_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DispatchError::Database(format!("Failed to insert incident: {}", e)))?;

        Ok(())
    }

    async fn update(&self, incident: &Incident) -> Result<(), DispatchError> {
        let result = sqlx::query(
            r#"
            UPDATE incidents SET
                status = $2
            WHERE id = $1
            "#,
        )
        .bind(incident.id().as_uuid())
        .bind(incident.status().as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| DispatchError::Database(format!("Failed to update incident: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DispatchError::not_found("incident", incident.id()));
        }

        Ok(())
    }

    async fn find_by_id(&self, id: &IncidentId) -> Result<Option<Incident>, DispatchError> {
        let row = sqlx::query(
            r#"
            SELECT id, station_id, agency_id, description, status, reported_by, created_at
            FROM incidents
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DispatchError::Database(format!("Failed to fetch incident: {}", e)))?;

        row.map(row_to_incident).transpose()
    }
}

fn row_to_incident(row: sqlx::postgres::PgRow) -> Result<Incident, DispatchError> {
    let id: uuid::Uuid = row
        .try_get("id")
        .map_err(|e| DispatchError::Database(format!("Failed to get id: {}", e)))?;

    let station_id: i64 = row
        .try_get("station_id")
        .map_err(|e| DispatchError::Database(format!("Failed to get station_id: {}", e)))?;

    let agency_id: i64 = row
        .try_get("agency_id")
        .map_err(|e| DispatchError::Database(format!("Failed to get agency_id: {}", e)))?;

    let description: String = row
        .try_get("description")
        .map_err(|e| DispatchError::Database(format!("Failed to get description: {}", e)))?;

    let status_str: String = row
        .try_get("status")
        .map_err(|e| DispatchError::Database(format!("Failed to get status: {}", e)))?;
    let status = IncidentStatus::parse(&status_str)
        .ok_or_else(|| DispatchError::Database(format!("Invalid incident status: {}", status_str)))?;

    let reported_by: String = row
        .try_get("reported_by")
        .map_err(|e| DispatchError::Database(format!("Failed to get reported_by: {}", e)))?;

    let created_at: chrono::DateTime<chrono::Utc> = row
        .try_get("created_at")
        .map_err(|e| DispatchError::Database(format!("Failed to get created_at: {}", e)))?;

    Ok(Incident::from_parts(
        IncidentId::from_uuid(id),
        StationId::from_raw(station_id),
        AgencyId::from_raw(agency_id),
        description,
        status,
        UserId::new(reported_by)
            .map_err(|e| DispatchError::Database(format!("Invalid reported_by: {}", e)))?,
        Timestamp::from_datetime(created_at),
    ))
}
