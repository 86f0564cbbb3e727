//! Payment handlers.
//!
//! ## Commands
//! - Initiating a purchase (prepay session or entitlement bypass)
//! - Reconciling provider payment notifications
//! - Maintaining entitlement records (admin)
//!
//! ## Services
//! - Entitlement evaluation

mod evaluate_entitlement;
mod handle_payment_notification;
mod initiate_payment;
mod manage_entitlement;

pub use evaluate_entitlement::EntitlementEvaluator;
pub use handle_payment_notification::{
    HandlePaymentNotificationCommand, HandlePaymentNotificationHandler, NotificationOutcome,
};
pub use initiate_payment::{
    InitiatePaymentCommand, InitiatePaymentHandler, InitiatePaymentResult, OrderCodeSource,
};
pub use manage_entitlement::{ManageEntitlementHandler, UpsertEntitlementCommand};
