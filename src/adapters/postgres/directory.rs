//! PostgreSQL implementation of GroupDirectory.
//!
//! Membership rows are written by the surrounding application whenever
//! rosters, agency staffing, or role grants change; this adapter only
//! reads them. Group keys are stored in their canonical text form
//! (`station:7`, `role:dispatcher`, `global`).

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::foundation::{DispatchError, UserId};
use crate::domain::routing::GroupKey;
use crate::ports::GroupDirectory;

/// PostgreSQL implementation of GroupDirectory.
#[derive(Clone)]
pub struct PostgresGroupDirectory {
    pool: PgPool,
}

impl PostgresGroupDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GroupDirectory for PostgresGroupDirectory {
    async fn users_in(&self, group: &GroupKey) -> Result<Vec<UserId>, DispatchError> {
        // A user group is its own membership; no table lookup needed.
        if let GroupKey::User(user) = group {
            return Ok(vec![user.clone()]);
        }

        let rows = sqlx::query(
            r#"
            SELECT user_id
            FROM group_members
            WHERE group_key = $1
            ORDER BY user_id
            "#,
        )
        .bind(group.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DispatchError::Database(format!("Failed to fetch group members: {}", e)))?;

        rows.into_iter()
            .map(|row| {
                let user_id: String = row
                    .try_get("user_id")
                    .map_err(|e| DispatchError::Database(format!("Failed to get user_id: {}", e)))?;
                UserId::new(user_id)
                    .map_err(|e| DispatchError::Database(format!("Invalid user_id: {}", e)))
            })
            .collect()
    }
}
