//! Entitlement configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Entitlement bypass configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EntitlementConfig {
    /// Order types for which an entitlement is consulted
    #[serde(default = "default_eligible_order_types")]
    pub eligible_order_types: Vec<u32>,
}

impl EntitlementConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.eligible_order_types.is_empty() {
            return Err(ValidationError::NoEligibleOrderTypes);
        }
        Ok(())
    }
}

impl Default for EntitlementConfig {
    fn default() -> Self {
        Self {
            eligible_order_types: default_eligible_order_types(),
        }
    }
}

fn default_eligible_order_types() -> Vec<u32> {
    vec![3]
}
