//! ManageEntitlementHandler - operator maintenance of entitlement records.
//!
//! ## Commands
//! - Insert (create or replace)
//! - Update (existing records only)
//! - Delete (the ledger customer is untouched)
//!
//! ## Queries
//! - Query by open id

use std::sync::Arc;

use crate::domain::entitlement::{Entitlement, EntitlementStatus};
use crate::domain::foundation::{DomainError, ErrorCode, OpenId, Timestamp};
use crate::ports::{EntitlementReader, EntitlementRepository};

/// Full entitlement record as supplied by an operator.
#[derive(Debug, Clone)]
pub struct UpsertEntitlementCommand {
    pub open_id: String,
    pub status: Option<EntitlementStatus>,
    pub grant_start: Option<Timestamp>,
    pub grant_end: Option<Timestamp>,
    pub granted_by: Option<String>,
}

impl UpsertEntitlementCommand {
    fn into_entitlement(self) -> Result<Entitlement, DomainError> {
        let entitlement = Entitlement {
            open_id: OpenId::new(self.open_id)?,
            status: self.status,
            grant_start: self.grant_start,
            grant_end: self.grant_end,
            granted_by: self.granted_by.filter(|s| !s.trim().is_empty()),
        };
        entitlement.validate()?;
        Ok(entitlement)
    }
}

/// Handler for entitlement administration.
pub struct ManageEntitlementHandler {
    reader: Arc<dyn EntitlementReader>,
    repository: Arc<dyn EntitlementRepository>,
}

impl ManageEntitlementHandler {
    pub fn new(
        reader: Arc<dyn EntitlementReader>,
        repository: Arc<dyn EntitlementRepository>,
    ) -> Self {
        Self { reader, repository }
    }

    /// Creates the record, replacing any existing one.
    pub async fn insert(&self, cmd: UpsertEntitlementCommand) -> Result<Entitlement, DomainError> {
        let entitlement = cmd.into_entitlement()?;
        self.repository.upsert(&entitlement).await?;
        tracing::info!(
            open_id = %entitlement.open_id,
            status = ?entitlement.status,
            granted_by = ?entitlement.granted_by,
            "Entitlement written"
        );
        Ok(entitlement)
    }

    /// Replaces an existing record. Fails with `EntitlementNotFound` otherwise.
    pub async fn update(&self, cmd: UpsertEntitlementCommand) -> Result<Entitlement, DomainError> {
        let entitlement = cmd.into_entitlement()?;
        self.repository.update(&entitlement).await?;
        tracing::info!(
            open_id = %entitlement.open_id,
            status = ?entitlement.status,
            granted_by = ?entitlement.granted_by,
            "Entitlement updated"
        );
        Ok(entitlement)
    }

    pub async fn query(&self, open_id: &str) -> Result<Entitlement, DomainError> {
        let open_id = OpenId::new(open_id)?;
        self.reader.lookup(&open_id).await?.ok_or_else(|| {
            DomainError::new(
                ErrorCode::EntitlementNotFound,
                format!("No entitlement for open id {}", open_id),
            )
        })
    }

    pub async fn delete(&self, open_id: &str) -> Result<(), DomainError> {
        let open_id = OpenId::new(open_id)?;
        self.repository.delete(&open_id).await?;
        tracing::info!(%open_id, "Entitlement deleted");
        Ok(())
    }
}
