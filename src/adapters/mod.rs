//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `http` - Axum REST surface
//! - `ledger` - Record-keeping service client (HTTP, in-memory)
//! - `memory` - In-memory stores for tests and local runs
//! - `mysql` - Entitlement and notification stores
//! - `wechat` - WeChat Pay provider (and a mock)

pub mod http;
pub mod ledger;
pub mod memory;
pub mod mysql;
pub mod wechat;

pub use ledger::{HttpOrderLedger, InMemoryLedger, LedgerClient};
pub use memory::{InMemoryEntitlementStore, InMemoryProcessedNotificationStore};
pub use mysql::{MySqlEntitlementStore, MySqlProcessedNotificationStore};
pub use wechat::{MockPaymentProvider, WechatPayAdapter, WechatPayConfig};
