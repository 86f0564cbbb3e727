//! Prepay Gateway - payment-order lifecycle service
//!
//! Issues WeChat Pay JSAPI prepay sessions, lets entitled customers bypass
//! payment, records customers and orders in an external ledger, and
//! reconciles the provider's payment notifications.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
