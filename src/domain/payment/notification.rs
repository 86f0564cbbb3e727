//! Verified payment notification.
//!
//! A `PaymentNotification` only exists after the provider adapter has checked
//! the signature and decrypted the resource, so every field is trusted.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::OrderCode;
use crate::domain::foundation::OpenId;

/// Provider trade state carried in a transaction notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TradeState {
    Success,
    Refund,
    NotPay,
    Closed,
    Revoked,
    UserPaying,
    PayError,
    /// Anything the provider adds later; never treated as success.
    Other(String),
}

impl TradeState {
    pub fn is_success(&self) -> bool {
        matches!(self, TradeState::Success)
    }

    pub fn as_str(&self) -> &str {
        match self {
            TradeState::Success => "SUCCESS",
            TradeState::Refund => "REFUND",
            TradeState::NotPay => "NOTPAY",
            TradeState::Closed => "CLOSED",
            TradeState::Revoked => "REVOKED",
            TradeState::UserPaying => "USERPAYING",
            TradeState::PayError => "PAYERROR",
            TradeState::Other(s) => s,
        }
    }
}

impl From<String> for TradeState {
    fn from(value: String) -> Self {
        match value.as_str() {
            "SUCCESS" => TradeState::Success,
            "REFUND" => TradeState::Refund,
            "NOTPAY" => TradeState::NotPay,
            "CLOSED" => TradeState::Closed,
            "REVOKED" => TradeState::Revoked,
            "USERPAYING" => TradeState::UserPaying,
            "PAYERROR" => TradeState::PayError,
            _ => TradeState::Other(value),
        }
    }
}

impl From<TradeState> for String {
    fn from(state: TradeState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for TradeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trusted content of an asynchronous payment notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentNotification {
    /// Provider event id (unique per delivery attempt family).
    pub event_id: String,
    pub event_type: String,
    pub trade_state: TradeState,
    pub order_code: OrderCode,
    pub payer_open_id: Option<OpenId>,
    pub transaction_id: Option<String>,
    /// Amount paid, in the smallest currency unit.
    pub amount_total: Option<i64>,
}

impl PaymentNotification {
    /// True when the notification reports a completed payment.
    pub fn is_paid(&self) -> bool {
        self.trade_state.is_success()
    }
}
