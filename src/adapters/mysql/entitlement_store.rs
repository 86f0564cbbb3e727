//! MySQL implementation of the entitlement ports.
//!
//! One table, `customer_entitlements`, keyed by open id. Every statement is
//! parameterized.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::MySqlPool;

use crate::domain::entitlement::{Entitlement, EntitlementStatus};
use crate::domain::foundation::{DomainError, ErrorCode, OpenId, Timestamp};
use crate::ports::{EntitlementReader, EntitlementRepository};

/// MySQL-backed entitlement store (read and write side).
#[derive(Clone)]
pub struct MySqlEntitlementStore {
    pool: MySqlPool,
}

impl MySqlEntitlementStore {
    /// Creates a new MySqlEntitlementStore with the given connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

/// Row for entitlement queries.
#[derive(Debug, sqlx::FromRow)]
struct EntitlementRow {
    open_id: String,
    status: Option<i8>,
    grant_start: Option<DateTime<Utc>>,
    grant_end: Option<DateTime<Utc>>,
    granted_by: Option<String>,
}

impl TryFrom<EntitlementRow> for Entitlement {
    type Error = DomainError;

    fn try_from(row: EntitlementRow) -> Result<Self, Self::Error> {
        Ok(Entitlement {
            open_id: OpenId::new(row.open_id).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid open_id: {}", e))
            })?,
            status: row.status.map(EntitlementStatus::from_flag),
            grant_start: row.grant_start.map(Timestamp::from_datetime),
            grant_end: row.grant_end.map(Timestamp::from_datetime),
            granted_by: row.granted_by,
        })
    }
}

fn not_found(open_id: &OpenId) -> DomainError {
    DomainError::new(
        ErrorCode::EntitlementNotFound,
        format!("No entitlement for open id {}", open_id),
    )
}

#[async_trait]
impl EntitlementReader for MySqlEntitlementStore {
    async fn lookup(&self, open_id: &OpenId) -> Result<Option<Entitlement>, DomainError> {
        let row: Option<EntitlementRow> = sqlx::query_as(
            r#"
            SELECT open_id, status, grant_start, grant_end, granted_by
            FROM customer_entitlements
            WHERE open_id = ?
            "#,
        )
        .bind(open_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to look up entitlement: {}", e)))?;

        row.map(Entitlement::try_from).transpose()
    }
}

#[async_trait]
impl EntitlementRepository for MySqlEntitlementStore {
    async fn upsert(&self, entitlement: &Entitlement) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO customer_entitlements (open_id, status, grant_start, grant_end, granted_by)
            VALUES (?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                status = VALUES(status),
                grant_start = VALUES(grant_start),
                grant_end = VALUES(grant_end),
                granted_by = VALUES(granted_by),
                updated_at = CURRENT_TIMESTAMP(6)
            "#,
        )
        .bind(entitlement.open_id.as_str())
        .bind(entitlement.status.map(|s| s.as_flag()))
        .bind(entitlement.grant_start.map(|t| *t.as_datetime()))
        .bind(entitlement.grant_end.map(|t| *t.as_datetime()))
        .bind(&entitlement.granted_by)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to save entitlement: {}", e)))?;

        Ok(())
    }

    async fn update(&self, entitlement: &Entitlement) -> Result<(), DomainError> {
        // updated_at always changes, so an existing row always counts as affected
        let result = sqlx::query(
            r#"
            UPDATE customer_entitlements SET
                status = ?,
                grant_start = ?,
                grant_end = ?,
                granted_by = ?,
                updated_at = CURRENT_TIMESTAMP(6)
            WHERE open_id = ?
            "#,
        )
        .bind(entitlement.status.map(|s| s.as_flag()))
        .bind(entitlement.grant_start.map(|t| *t.as_datetime()))
        .bind(entitlement.grant_end.map(|t| *t.as_datetime()))
        .bind(&entitlement.granted_by)
        .bind(entitlement.open_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to update entitlement: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(not_found(&entitlement.open_id));
        }

        Ok(())
    }

    async fn delete(&self, open_id: &OpenId) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM customer_entitlements WHERE open_id = ?")
            .bind(open_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to delete entitlement: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(not_found(open_id));
        }

        Ok(())
    }
}
