//! In-memory entitlement store for tests and local development.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::entitlement::Entitlement;
use crate::domain::foundation::{DomainError, ErrorCode, OpenId};
use crate::ports::{EntitlementReader, EntitlementRepository};

/// In-memory implementation of both entitlement ports.
#[derive(Default)]
pub struct InMemoryEntitlementStore {
    records: RwLock<HashMap<OpenId, Entitlement>>,
    unavailable: RwLock<bool>,
}

impl InMemoryEntitlementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with the given records.
    pub fn with_records(records: impl IntoIterator<Item = Entitlement>) -> Self {
        let map = records
            .into_iter()
            .map(|e| (e.open_id.clone(), e))
            .collect();
        Self {
            records: RwLock::new(map),
            unavailable: RwLock::new(false),
        }
    }

    /// Make every subsequent call fail with a database error (or recover).
    pub async fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.write().await = unavailable;
    }

    async fn check_available(&self) -> Result<(), DomainError> {
        if *self.unavailable.read().await {
            return Err(DomainError::database("entitlement store unavailable"));
        }
        Ok(())
    }
}

fn not_found(open_id: &OpenId) -> DomainError {
    DomainError::new(
        ErrorCode::EntitlementNotFound,
        format!("No entitlement for open id {}", open_id),
    )
}

#[async_trait]
impl EntitlementReader for InMemoryEntitlementStore {
    async fn lookup(&self, open_id: &OpenId) -> Result<Option<Entitlement>, DomainError> {
        self.check_available().await?;
        Ok(self.records.read().await.get(open_id).cloned())
    }
}

#[async_trait]
impl EntitlementRepository for InMemoryEntitlementStore {
    async fn upsert(&self, entitlement: &Entitlement) -> Result<(), DomainError> {
        self.check_available().await?;
        self.records
            .write()
            .await
            .insert(entitlement.open_id.clone(), entitlement.clone());
        Ok(())
    }

    async fn update(&self, entitlement: &Entitlement) -> Result<(), DomainError> {
        self.check_available().await?;
        let mut records = self.records.write().await;
        match records.get_mut(&entitlement.open_id) {
            Some(existing) => {
                *existing = entitlement.clone();
                Ok(())
            }
            None => Err(not_found(&entitlement.open_id)),
        }
    }

    async fn delete(&self, open_id: &OpenId) -> Result<(), DomainError> {
        self.check_available().await?;
        self.records
            .write()
            .await
            .remove(open_id)
            .map(|_| ())
            .ok_or_else(|| not_found(open_id))
    }
}
