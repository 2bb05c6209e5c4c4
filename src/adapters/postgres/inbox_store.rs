//! PostgreSQL implementation of InboxStore.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::dispatch::EventKind;
use crate::domain::foundation::{DispatchError, InboxEntryId, IncidentId, Timestamp, UserId};
use crate::domain::notification::InboxEntry;
use crate::ports::InboxStore;

/// PostgreSQL implementation of InboxStore.
#[derive(Clone)]
pub struct PostgresInboxStore {
    pool: PgPool,
}

impl PostgresInboxStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InboxStore for PostgresInboxStore {
    async fn insert(&self, entry: &InboxEntry) -> Result<(), DispatchError> {
        sqlx::query(
            r#"
            INSERT INTO inbox_entries (
                id, user_id, event_kind, title, message, incident_id, is_read, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(entry.id().as_uuid())
        .bind(entry.user_id().as_str())
        .bind(entry.event_kind().as_str())
        .bind(entry.title())
        .bind(entry.message())
        .bind(entry.incident_id().map(|id| *id.as_uuid()))
        .bind(entry.is_read())
        .bind(entry.created_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DispatchError::Database(format!("Failed to insert inbox entry: {}", e)))?;

        Ok(())
    }

    async fn for_user(
        &self,
        user_id: &UserId,
        unread_only: bool,
    ) -> Result<Vec<InboxEntry>, DispatchError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, event_kind, title, message, incident_id, is_read, created_at
            FROM inbox_entries
            WHERE user_id = $1
              AND ($2 = false OR is_read = false)
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id.as_str())
        .bind(unread_only)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DispatchError::Database(format!("Failed to fetch inbox entries: {}", e)))?;

        rows.into_iter().map(row_to_entry).collect()
    }

    async fn mark_read(&self, entry_id: &InboxEntryId) -> Result<(), DispatchError> {
        sqlx::query("UPDATE inbox_entries SET is_read = true WHERE id = $1")
            .bind(entry_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DispatchError::Database(format!("Failed to mark inbox entry read: {}", e))
            })?;

        Ok(())
    }

    async fn mark_all_read(&self, user_id: &UserId) -> Result<(), DispatchError> {
        sqlx::query("UPDATE inbox_entries SET is_read = true WHERE user_id = $1")
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| DispatchError::Database(format!("Failed to mark inbox read: {}", e)))?;

        Ok(())
    }

    async fn remove(&self, entry_id: &InboxEntryId) -> Result<(), DispatchError> {
        sqlx::query("DELETE FROM inbox_entries WHERE id = $1")
            .bind(entry_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DispatchError::Database(format!("Failed to delete inbox entry: {}", e))
            })?;

        Ok(())
    }

    async fn clear_all(&self, user_id: &UserId) -> Result<(), DispatchError> {
        sqlx::query("DELETE FROM inbox_entries WHERE user_id = $1")
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| DispatchError::Database(format!("Failed to clear inbox: {}", e)))?;

        Ok(())
    }
}

fn row_to_entry(row: sqlx::postgres::PgRow) -> Result<InboxEntry, DispatchError> {
    let id: uuid::Uuid = row
        .try_get("id")
        .map_err(|e| DispatchError::Database(format!("Failed to get id: {}", e)))?;

    let user_id: String = row
        .try_get("user_id")
        .map_err(|e| DispatchError::Database(format!("Failed to get user_id: {}", e)))?;

    let event_kind: String = row
        .try_get("event_kind")
        .map_err(|e| DispatchError::Database(format!("Failed to get event_kind: {}", e)))?;
    let kind: EventKind = serde_json::from_value(serde_json::Value::String(event_kind.clone()))
        .map_err(|_| DispatchError::Database(format!("Invalid event kind: {}", event_kind)))?;

    let title: String = row
        .try_get("title")
        .map_err(|e| DispatchError::Database(format!("Failed to get title: {}", e)))?;

    let message: String = row
        .try_get("message")
        .map_err(|e| DispatchError::Database(format!("Failed to get message: {}", e)))?;

    let incident_id: Option<uuid::Uuid> = row
        .try_get("incident_id")
        .map_err(|e| DispatchError::Database(format!("Failed to get incident_id: {}", e)))?;

    let is_read: bool = row
        .try_get("is_read")
        .map_err(|e| DispatchError::Database(format!("Failed to get is_read: {}", e)))?;

    let created_at: chrono::DateTime<chrono::Utc> = row
        .try_get("created_at")
        .map_err(|e| DispatchError::Database(format!("Failed to get created_at: {}", e)))?;

    Ok(InboxEntry::from_parts(
        InboxEntryId::from_uuid(id),
        UserId::new(user_id)
            .map_err(|e| DispatchError::Database(format!("Invalid user_id: {}", e)))?,
        kind,
        title,
        message,
        incident_id.map(IncidentId::from_uuid),
        is_read,
        Timestamp::from_datetime(created_at),
    ))
}
