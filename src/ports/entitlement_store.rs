//! Entitlement store ports (read and write side).
//!
//! The purchase flow only reads; the admin endpoints write.
//!
//! # Example
//!
//! ```ignore
//! async fn is_entitled(reader: &dyn EntitlementReader, open_id: &OpenId) -> bool {
//!     match reader.lookup(open_id).await {
//!         Ok(Some(record)) => record.permits_bypass(&Timestamp::now()),
//!         _ => false, // absent or unreadable: fail closed
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::domain::entitlement::Entitlement;
use crate::domain::foundation::{DomainError, OpenId};

/// Read side: lookup by open id.
#[async_trait]
pub trait EntitlementReader: Send + Sync {
    /// Returns the record for the customer, or `None` if there is none.
    async fn lookup(&self, open_id: &OpenId) -> Result<Option<Entitlement>, DomainError>;
}

/// Write side, used by the administration endpoints.
#[async_trait]
pub trait EntitlementRepository: Send + Sync {
    /// Create the record, replacing any existing one for the same open id.
    async fn upsert(&self, entitlement: &Entitlement) -> Result<(), DomainError>;

    /// Update an existing record.
    ///
    /// # Errors
    ///
    /// - `EntitlementNotFound` if no record exists for the open id
    async fn update(&self, entitlement: &Entitlement) -> Result<(), DomainError>;

    /// Remove the record. The customer itself is untouched.
    ///
    /// # Errors
    ///
    /// - `EntitlementNotFound` if no record exists for the open id
    async fn delete(&self, open_id: &OpenId) -> Result<(), DomainError>;
}
