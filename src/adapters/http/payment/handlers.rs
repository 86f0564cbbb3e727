//! HTTP handlers for payment endpoints.
//!
//! These handlers connect Axum routes to application layer command handlers.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequestParts, Json, State};
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;

use crate::application::handlers::payment::{
    EntitlementEvaluator, HandlePaymentNotificationCommand, HandlePaymentNotificationHandler,
    InitiatePaymentCommand, InitiatePaymentHandler, ManageEntitlementHandler,
};
use crate::domain::entitlement::EntitlementPolicy;
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::payment::{OrderType, PaymentOrderError};
use crate::ports::{
    EntitlementReader, EntitlementRepository, NotificationHeaders, OrderLedger, PaymentProvider,
    ProcessedNotificationStore,
};

use super::dto::{
    EntitlementRequest, EntitlementResponse, ErrorResponse, HealthResponse,
    InitiatePaymentRequest, NotificationAck, OpenIdRequest, PaymentSessionResponse,
};

/// Header carrying the admin token.
pub const ADMIN_TOKEN_HEADER: &str = "X-Admin-Token";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// Cloned for each request; dependencies are Arc-wrapped.
#[derive(Clone)]
pub struct PaymentAppState {
    pub ledger: Arc<dyn OrderLedger>,
    pub payment_provider: Arc<dyn PaymentProvider>,
    pub entitlement_reader: Arc<dyn EntitlementReader>,
    pub entitlement_repository: Arc<dyn EntitlementRepository>,
    pub processed_notifications: Arc<dyn ProcessedNotificationStore>,
    pub entitlement_policy: EntitlementPolicy,
    /// Admin routes reject every call while this is `None`.
    pub admin_token: Option<SecretString>,
}

impl PaymentAppState {
    /// Create handlers on demand from the shared state.
    pub fn initiate_payment_handler(&self) -> InitiatePaymentHandler {
        let evaluator = EntitlementEvaluator::new(
            self.entitlement_reader.clone(),
            self.entitlement_policy.clone(),
        );
        InitiatePaymentHandler::new(
            self.ledger.clone(),
            self.payment_provider.clone(),
            Arc::new(evaluator),
        )
    }

    pub fn notification_handler(&self) -> HandlePaymentNotificationHandler {
        HandlePaymentNotificationHandler::new(
            self.payment_provider.clone(),
            self.ledger.clone(),
            self.processed_notifications.clone(),
        )
    }

    pub fn entitlement_handler(&self) -> ManageEntitlementHandler {
        ManageEntitlementHandler::new(
            self.entitlement_reader.clone(),
            self.entitlement_repository.clone(),
        )
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Admin Authorization
// ════════════════════════════════════════════════════════════════════════════════

/// Proof that the request carried the configured admin token.
#[derive(Debug, Clone, Copy)]
pub struct AdminAuthorized;

#[async_trait]
impl FromRequestParts<PaymentAppState> for AdminAuthorized {
    type Rejection = PaymentApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &PaymentAppState,
    ) -> Result<Self, Self::Rejection> {
        let expected = state
            .admin_token
            .as_ref()
            .map(|t| t.expose_secret().as_bytes())
            .filter(|t| !t.is_empty())
            .ok_or(PaymentApiError::Unauthorized)?;

        let supplied = parts
            .headers
            .get(ADMIN_TOKEN_HEADER)
            .map(|v| v.as_bytes())
            .ok_or(PaymentApiError::Unauthorized)?;

        if bool::from(supplied.ct_eq(expected)) {
            Ok(AdminAuthorized)
        } else {
            Err(PaymentApiError::Unauthorized)
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Purchase and Notification Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /payment/jsapi - Start a purchase
pub async fn initiate_payment(
    State(state): State<PaymentAppState>,
    payload: Result<Json<InitiatePaymentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, PaymentApiError> {
    let Json(request) = payload?;
    let handler = state.initiate_payment_handler();
    let cmd = InitiatePaymentCommand {
        open_id: request.openid,
        amount: request.amount,
        order_type: OrderType::new(request.order_type),
    };

    let result = handler.handle(cmd).await?;

    Ok(Json(PaymentSessionResponse::from(result)))
}

/// POST /wx_payment_notify/jsapi_notify_url - Provider payment callback
///
/// Always answers 200 so the provider stops redelivering; the outcome is
/// only reported in the message and the logs.
pub async fn payment_notification(
    State(state): State<PaymentAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let handler = state.notification_handler();
    let cmd = HandlePaymentNotificationCommand {
        headers: notification_headers(&headers),
        body: body.to_vec(),
    };

    let outcome = handler.handle(cmd).await;

    (StatusCode::OK, Json(NotificationAck::success(outcome.label())))
}

/// GET /health - Liveness check
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

fn notification_headers(headers: &HeaderMap) -> NotificationHeaders {
    let get = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };
    NotificationHeaders {
        serial: get(NotificationHeaders::SERIAL),
        timestamp: get(NotificationHeaders::TIMESTAMP),
        nonce: get(NotificationHeaders::NONCE),
        signature: get(NotificationHeaders::SIGNATURE),
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Entitlement Administration
// ════════════════════════════════════════════════════════════════════════════════

/// POST /platform/whitelist_insert - Create or replace an entitlement
pub async fn insert_entitlement(
    State(state): State<PaymentAppState>,
    _admin: AdminAuthorized,
    payload: Result<Json<EntitlementRequest>, JsonRejection>,
) -> Result<impl IntoResponse, PaymentApiError> {
    let Json(request) = payload?;
    let entitlement = state.entitlement_handler().insert(request.into()).await?;
    Ok((StatusCode::CREATED, Json(EntitlementResponse::from(entitlement))))
}

/// POST /platform/whitelist_update - Update an existing entitlement
pub async fn update_entitlement(
    State(state): State<PaymentAppState>,
    _admin: AdminAuthorized,
    payload: Result<Json<EntitlementRequest>, JsonRejection>,
) -> Result<impl IntoResponse, PaymentApiError> {
    let Json(request) = payload?;
    let entitlement = state.entitlement_handler().update(request.into()).await?;
    Ok(Json(EntitlementResponse::from(entitlement)))
}

/// POST /platform/whitelist_query - Read an entitlement
pub async fn query_entitlement(
    State(state): State<PaymentAppState>,
    _admin: AdminAuthorized,
    payload: Result<Json<OpenIdRequest>, JsonRejection>,
) -> Result<impl IntoResponse, PaymentApiError> {
    let Json(request) = payload?;
    let entitlement = state.entitlement_handler().query(&request.openid).await?;
    Ok(Json(EntitlementResponse::from(entitlement)))
}

/// POST /platform/whitelist_delete - Remove an entitlement
pub async fn delete_entitlement(
    State(state): State<PaymentAppState>,
    _admin: AdminAuthorized,
    payload: Result<Json<OpenIdRequest>, JsonRejection>,
) -> Result<impl IntoResponse, PaymentApiError> {
    let Json(request) = payload?;
    state.entitlement_handler().delete(&request.openid).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts application errors to HTTP responses.
#[derive(Debug)]
pub enum PaymentApiError {
    Order(PaymentOrderError),
    Domain(DomainError),
    BadBody(String),
    Unauthorized,
}

impl From<PaymentOrderError> for PaymentApiError {
    fn from(err: PaymentOrderError) -> Self {
        Self::Order(err)
    }
}

impl From<DomainError> for PaymentApiError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

impl From<JsonRejection> for PaymentApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadBody(rejection.body_text())
    }
}

impl IntoResponse for PaymentApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            PaymentApiError::Order(err) => {
                let status = match &err {
                    PaymentOrderError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
                    PaymentOrderError::Provider(_) => StatusCode::BAD_GATEWAY,
                    PaymentOrderError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.code().to_string(), err.message())
            }
            PaymentApiError::Domain(err) => {
                let status = match err.code {
                    ErrorCode::ValidationFailed
                    | ErrorCode::EmptyField
                    | ErrorCode::InvalidFormat => StatusCode::BAD_REQUEST,
                    ErrorCode::EntitlementNotFound => StatusCode::NOT_FOUND,
                    ErrorCode::InvalidStateTransition => StatusCode::CONFLICT,
                    ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
                    ErrorCode::DatabaseError
                    | ErrorCode::ExternalServiceError
                    | ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
                };
                if status.is_server_error() {
                    tracing::error!(error = %err, "Admin request failed");
                    (status, err.code.to_string(), "Internal error".to_string())
                } else {
                    (status, err.code.to_string(), err.message)
                }
            }
            PaymentApiError::BadBody(message) => (
                StatusCode::BAD_REQUEST,
                ErrorCode::ValidationFailed.to_string(),
                message,
            ),
            PaymentApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ErrorCode::Unauthorized.to_string(),
                "Admin token missing or invalid".to_string(),
            ),
        };

        (status, Json(ErrorResponse::new(error_code, message))).into_response()
    }
}
