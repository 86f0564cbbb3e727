//! MySQL adapters - Database implementations for storage ports.
//!
//! - `MySqlEntitlementStore` - Entitlement lookups and administration
//! - `MySqlProcessedNotificationStore` - Notification idempotency records

mod entitlement_store;
mod processed_notification_store;

pub use entitlement_store::MySqlEntitlementStore;
pub use processed_notification_store::MySqlProcessedNotificationStore;
