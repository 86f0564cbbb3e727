//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Outbound Ports
//!
//! - `OrderLedger` - Customer and order records in the external ledger
//! - `PaymentProvider` - Prepay sessions and notification verification
//! - `EntitlementReader` / `EntitlementRepository` - Entitlement records
//!
//! ## Idempotency Ports
//!
//! - `ProcessedNotificationStore` - Orders already reconciled from a notification

mod entitlement_store;
mod order_ledger;
mod payment_provider;
mod processed_notification_store;

pub use entitlement_store::{EntitlementReader, EntitlementRepository};
pub use order_ledger::{LedgerError, OrderLedger};
pub use payment_provider::{
    NotificationHeaders, PaymentError, PaymentErrorCode, PaymentProvider, PrepayRequest,
};
pub use processed_notification_store::ProcessedNotificationStore;
