//! MySQL implementation of ProcessedNotificationStore.
//!
//! `processed_notifications` has the order code as primary key. A claim is
//! an `INSERT IGNORE`; one affected row means this caller won it.

use async_trait::async_trait;
use sqlx::MySqlPool;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::domain::payment::OrderCode;
use crate::ports::ProcessedNotificationStore;

/// MySQL-backed record of reconciled orders.
#[derive(Clone)]
pub struct MySqlProcessedNotificationStore {
    pool: MySqlPool,
}

impl MySqlProcessedNotificationStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProcessedNotificationStore for MySqlProcessedNotificationStore {
    async fn contains(&self, order_code: &OrderCode) -> Result<bool, DomainError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT order_code FROM processed_notifications WHERE order_code = ?")
                .bind(order_code.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::database(format!("Failed to check processed notification: {}", e))
                })?;

        Ok(row.is_some())
    }

    async fn try_claim(&self, order_code: &OrderCode) -> Result<bool, DomainError> {
        let result =
            sqlx::query("INSERT IGNORE INTO processed_notifications (order_code) VALUES (?)")
                .bind(order_code.as_str())
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::database(format!("Failed to claim processed notification: {}", e))
                })?;

        Ok(result.rows_affected() == 1)
    }

    async fn release(&self, order_code: &OrderCode) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM processed_notifications WHERE order_code = ?")
            .bind(order_code.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DomainError::database(format!("Failed to release processed notification: {}", e))
            })?;

        Ok(())
    }

    async fn delete_before(&self, timestamp: Timestamp) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM processed_notifications WHERE processed_at < ?")
            .bind(*timestamp.as_datetime())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DomainError::database(format!("Failed to prune processed notifications: {}", e))
            })?;

        Ok(result.rows_affected())
    }
}
