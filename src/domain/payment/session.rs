//! Client-facing payment session.

use serde::{Deserialize, Serialize};

/// Parameters the client needs to open the provider's native payment sheet.
///
/// Produced once per purchase attempt and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSession {
    /// Unix seconds, as a string (provider convention).
    pub timestamp: String,
    pub nonce_str: String,
    /// `prepay_id=<id>`.
    pub package: String,
    pub sign_type: String,
    pub pay_sign: String,
}

impl PaymentSession {
    /// Session returned when an entitlement bypass made payment unnecessary.
    ///
    /// Every payable field is empty, so the client has nothing to submit.
    pub fn placeholder() -> Self {
        Self::default()
    }

    /// True when this session carries no payable parameters.
    pub fn is_placeholder(&self) -> bool {
        self.pay_sign.is_empty() && self.package.is_empty()
    }
}
