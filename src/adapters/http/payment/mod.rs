//! HTTP adapter for payment endpoints.
//!
//! Exposes the purchase flow, the provider callback and entitlement
//! administration via REST API.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use handlers::{AdminAuthorized, PaymentApiError, PaymentAppState, ADMIN_TOKEN_HEADER};
pub use routes::{notification_router, payment_router, NOTIFY_PATH};
