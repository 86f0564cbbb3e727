//! ProcessedNotificationStore port - idempotency for payment notifications.
//!
//! The provider redelivers a notification until it sees an acknowledgement,
//! and may redeliver even after one. An order code is claimed before the
//! ledger edit, so concurrent deliveries of the same notification reach the
//! ledger at most once. A failed edit releases the claim for the next
//! delivery.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::domain::payment::OrderCode;

/// Port for tracking which orders have been reconciled (or are being).
///
/// # Example
///
/// ```ignore
/// if !store.try_claim(&order_code).await? {
///     return Ok(NotificationOutcome::Duplicate);
/// }
///
/// if ledger.mark_order_paid(&order_code).await.is_err() {
///     store.release(&order_code).await?;
/// }
/// ```
#[async_trait]
pub trait ProcessedNotificationStore: Send + Sync {
    /// Returns `true` if the order has been claimed.
    async fn contains(&self, order_code: &OrderCode) -> Result<bool, DomainError>;

    /// Atomically records the order code.
    ///
    /// Returns `true` only for the caller that inserted it; `false` means
    /// another delivery already holds or completed the claim.
    async fn try_claim(&self, order_code: &OrderCode) -> Result<bool, DomainError>;

    /// Drops a claim whose ledger edit failed. Unknown codes are ignored.
    async fn release(&self, order_code: &OrderCode) -> Result<(), DomainError>;

    /// Delete entries older than `timestamp`. Returns the number removed.
    async fn delete_before(&self, timestamp: Timestamp) -> Result<u64, DomainError>;
}
