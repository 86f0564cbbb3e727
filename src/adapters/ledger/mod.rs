//! Ledger adapters - implementations of the `OrderLedger` port.
//!
//! - `HttpOrderLedger` over `LedgerClient` - the external record-keeping service
//! - `InMemoryLedger` - state-machine-checked ledger for tests and local runs

mod http_ledger;
mod in_memory;

pub use http_ledger::{HttpOrderLedger, LedgerClient, LedgerEndpoint};
pub use in_memory::{InMemoryLedger, LedgerCall, LedgerOrder};
