//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod payment;

pub use payment::{
    EntitlementEvaluator, HandlePaymentNotificationCommand, HandlePaymentNotificationHandler,
    InitiatePaymentCommand, InitiatePaymentHandler, InitiatePaymentResult,
    ManageEntitlementHandler, NotificationOutcome, UpsertEntitlementCommand,
};
