//! In-memory adapters for tests and local development.

mod entitlement_store;
mod processed_notification_store;

pub use entitlement_store::InMemoryEntitlementStore;
pub use processed_notification_store::InMemoryProcessedNotificationStore;
