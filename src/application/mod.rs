//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Handlers receive their dependencies as `Arc<dyn Port>` and never touch
//! HTTP or SQL directly.

pub mod handlers;

pub use handlers::{
    EntitlementEvaluator, HandlePaymentNotificationCommand, HandlePaymentNotificationHandler,
    InitiatePaymentCommand, InitiatePaymentHandler, InitiatePaymentResult,
    ManageEntitlementHandler, NotificationOutcome, UpsertEntitlementCommand,
};
