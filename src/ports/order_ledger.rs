//! Order ledger port - the external record-keeping service.
//!
//! The ledger owns customer and order records. This service only writes to
//! it: upsert a customer, create an order, flip an order to paid.
//!
//! # Design
//!
//! - **No retries**: a failed write is reported once and left to the caller
//! - **Idempotent edits**: marking an already-paid order paid is a no-op

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, OpenId};
use crate::domain::payment::{OrderCode, OrderType};

/// Port for writing customer and order state to the ledger.
#[async_trait]
pub trait OrderLedger: Send + Sync {
    /// Create the customer if absent. Safe to repeat.
    async fn save_customer(&self, open_id: &OpenId) -> Result<(), LedgerError>;

    /// Record a new order in the `created` state.
    async fn save_order(
        &self,
        order_code: &OrderCode,
        order_type: OrderType,
        open_id: &OpenId,
    ) -> Result<(), LedgerError>;

    /// Move an order to `paid`.
    async fn mark_order_paid(&self, order_code: &OrderCode) -> Result<(), LedgerError>;
}

/// Errors from the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Connection, timeout or body read failure.
    #[error("ledger unreachable: {0}")]
    Transport(String),

    /// The ledger answered with a non-success status.
    #[error("ledger returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Request body could not be encoded.
    #[error("ledger request encoding failed: {0}")]
    Encode(String),

    /// The ledger refused an edit that would break the order lifecycle.
    #[error("ledger rejected edit: {0}")]
    Rejected(String),
}

impl From<LedgerError> for DomainError {
    fn from(err: LedgerError) -> Self {
        let code = match err {
            LedgerError::Rejected(_) => ErrorCode::InvalidStateTransition,
            _ => ErrorCode::ExternalServiceError,
        };
        DomainError::new(code, err.to_string())
    }
}
