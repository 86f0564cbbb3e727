//! Which order types are eligible for an entitlement bypass.

use crate::domain::payment::OrderType;

/// Set of order types for which an entitlement is consulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitlementPolicy {
    eligible_order_types: Vec<OrderType>,
}

impl EntitlementPolicy {
    pub fn new(eligible_order_types: impl IntoIterator<Item = OrderType>) -> Self {
        Self {
            eligible_order_types: eligible_order_types.into_iter().collect(),
        }
    }

    pub fn is_eligible(&self, order_type: OrderType) -> bool {
        self.eligible_order_types.contains(&order_type)
    }

    pub fn eligible_order_types(&self) -> &[OrderType] {
        &self.eligible_order_types
    }
}

impl Default for EntitlementPolicy {
    fn default() -> Self {
        Self::new([OrderType::ENTITLEMENT_TIER])
    }
}
