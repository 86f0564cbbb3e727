//! In-memory ProcessedNotificationStore.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::domain::payment::OrderCode;
use crate::ports::ProcessedNotificationStore;

/// In-memory record of reconciled orders with their processing time.
#[derive(Default)]
pub struct InMemoryProcessedNotificationStore {
    processed: RwLock<HashMap<OrderCode, Timestamp>>,
    unavailable: RwLock<bool>,
}

impl InMemoryProcessedNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a database error (or recover).
    pub async fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.write().await = unavailable;
    }

    pub async fn len(&self) -> usize {
        self.processed.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.processed.read().await.is_empty()
    }

    async fn check_available(&self) -> Result<(), DomainError> {
        if *self.unavailable.read().await {
            return Err(DomainError::database("processed notification store unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl ProcessedNotificationStore for InMemoryProcessedNotificationStore {
    async fn contains(&self, order_code: &OrderCode) -> Result<bool, DomainError> {
        self.check_available().await?;
        Ok(self.processed.read().await.contains_key(order_code))
    }

    async fn try_claim(&self, order_code: &OrderCode) -> Result<bool, DomainError> {
        self.check_available().await?;
        let mut processed = self.processed.write().await;
        if processed.contains_key(order_code) {
            return Ok(false);
        }
        processed.insert(order_code.clone(), Timestamp::now());
        Ok(true)
    }

    async fn release(&self, order_code: &OrderCode) -> Result<(), DomainError> {
        self.check_available().await?;
        self.processed.write().await.remove(order_code);
        Ok(())
    }

    async fn delete_before(&self, timestamp: Timestamp) -> Result<u64, DomainError> {
        self.check_available().await?;
        let mut processed = self.processed.write().await;
        let before = processed.len();
        processed.retain(|_, at| !at.is_before(&timestamp));
        Ok((before - processed.len()) as u64)
    }
}
