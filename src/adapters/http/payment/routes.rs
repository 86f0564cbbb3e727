//! Axum router configuration for payment endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    delete_entitlement, health, initiate_payment, insert_entitlement, payment_notification,
    query_entitlement, update_entitlement, PaymentAppState,
};

/// Path the provider posts payment notifications to.
pub const NOTIFY_PATH: &str = "/wx_payment_notify/jsapi_notify_url";

/// Create the payment API router.
///
/// # Routes
///
/// ## Client Endpoints
/// - `POST /payment/jsapi` - Start a purchase
///
/// ## Admin Endpoints (require `X-Admin-Token`)
/// - `POST /platform/whitelist_insert`
/// - `POST /platform/whitelist_update`
/// - `POST /platform/whitelist_query`
/// - `POST /platform/whitelist_delete`
///
/// ## Health
/// - `GET /health`
pub fn payment_router() -> Router<PaymentAppState> {
    Router::new()
        .route("/payment/jsapi", post(initiate_payment))
        .route("/platform/whitelist_insert", post(insert_entitlement))
        .route("/platform/whitelist_update", post(update_entitlement))
        .route("/platform/whitelist_query", post(query_entitlement))
        .route("/platform/whitelist_delete", post(delete_entitlement))
        .route("/health", get(health))
}

/// Provider callback router (signature verified, always 200).
///
/// - `POST /wx_payment_notify/jsapi_notify_url`
///
/// Must stay outside any request timeout layer: the provider always gets a
/// 200 and a ledger edit in flight runs to completion.
pub fn notification_router() -> Router<PaymentAppState> {
    Router::new().route(NOTIFY_PATH, post(payment_notification))
}
