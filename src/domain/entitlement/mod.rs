//! Entitlement domain - time-bounded payment bypass grants.

mod record;
mod policy;

pub use record::{Entitlement, EntitlementDecision, EntitlementStatus};
pub use policy::EntitlementPolicy;
