//! Order type classifier and order status state machine.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Caller-supplied product tier classifier.
///
/// Opaque to this service except for entitlement eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderType(u32);

impl OrderType {
    /// The tier a valid entitlement lets a customer take without paying.
    pub const ENTITLEMENT_TIER: OrderType = OrderType(3);

    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of an order as driven from this service.
///
/// The ledger holds the authoritative value; this enum encodes which edits
/// are legal. `Paid` never regresses, and re-marking it is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Recorded, awaiting payment or an entitlement bypass.
    Created,

    /// Settled by bypass or by a verified provider notification.
    Paid,
}

impl StateMachine for OrderStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use OrderStatus::*;
        matches!((self, target), (Created, Paid) | (Paid, Paid))
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use OrderStatus::*;
        match self {
            Created => vec![Paid],
            Paid => vec![Paid],
        }
    }
}
