//! HTTP adapters - REST API implementations.

pub mod payment;

use std::time::Duration;

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, HeaderValue, Method};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use payment::{notification_router, payment_router, PaymentAppState, ADMIN_TOKEN_HEADER};

/// Full application router with tracing, CORS and request timeout layers.
///
/// The timeout covers the client and admin routes only. The provider callback
/// is merged in after it and always runs to completion.
pub fn app_router(
    state: PaymentAppState,
    cors_origins: &[String],
    request_timeout: Duration,
) -> Router {
    payment_router()
        .layer(TimeoutLayer::new(request_timeout))
        .merge(notification_router())
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            CONTENT_TYPE,
            HeaderName::from_static("x-admin-token"),
        ])
}
