//! Request and response DTOs for payment endpoints.
//!
//! These types handle JSON serialization for the HTTP API.

use serde::{Deserialize, Serialize};

use crate::application::handlers::payment::{InitiatePaymentResult, UpsertEntitlementCommand};
use crate::domain::entitlement::{Entitlement, EntitlementStatus};
use crate::domain::foundation::Timestamp;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request body for `POST /payment/jsapi`.
#[derive(Debug, Clone, Deserialize)]
pub struct InitiatePaymentRequest {
    #[serde(alias = "open_id")]
    pub openid: String,
    /// Amount in fen.
    pub amount: i64,
    #[serde(alias = "data_platform_order_type")]
    pub order_type: u32,
}

/// Request body for entitlement insert/update.
#[derive(Debug, Clone, Deserialize)]
pub struct EntitlementRequest {
    #[serde(alias = "open_id")]
    pub openid: String,
    #[serde(default)]
    pub status: Option<EntitlementStatus>,
    #[serde(default)]
    pub grant_start: Option<Timestamp>,
    #[serde(default)]
    pub grant_end: Option<Timestamp>,
    #[serde(default)]
    pub granted_by: Option<String>,
}

impl From<EntitlementRequest> for UpsertEntitlementCommand {
    fn from(req: EntitlementRequest) -> Self {
        UpsertEntitlementCommand {
            open_id: req.openid,
            status: req.status,
            grant_start: req.grant_start,
            grant_end: req.grant_end,
            granted_by: req.granted_by,
        }
    }
}

/// Request body for entitlement query/delete.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenIdRequest {
    #[serde(alias = "open_id")]
    pub openid: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Parameters the client passes to the native payment sheet.
///
/// All session fields are empty when `bypassed` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSessionResponse {
    pub timestamp: String,
    pub nonce_str: String,
    pub package: String,
    pub sign_type: String,
    pub pay_sign: String,
    pub order_code: String,
    pub bypassed: bool,
}

impl From<InitiatePaymentResult> for PaymentSessionResponse {
    fn from(result: InitiatePaymentResult) -> Self {
        let session = result.session;
        Self {
            timestamp: session.timestamp,
            nonce_str: session.nonce_str,
            package: session.package,
            sign_type: session.sign_type,
            pay_sign: session.pay_sign,
            order_code: result.order_code.to_string(),
            bypassed: result.bypassed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitlementResponse {
    pub openid: String,
    pub status: Option<EntitlementStatus>,
    pub grant_start: Option<Timestamp>,
    pub grant_end: Option<Timestamp>,
    pub granted_by: Option<String>,
}

impl From<Entitlement> for EntitlementResponse {
    fn from(e: Entitlement) -> Self {
        Self {
            openid: e.open_id.to_string(),
            status: e.status,
            grant_start: e.grant_start,
            grant_end: e.grant_end,
            granted_by: e.granted_by,
        }
    }
}

/// Acknowledgement body returned to the provider for every notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationAck {
    pub code: String,
    pub message: String,
}

impl NotificationAck {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            code: "SUCCESS".to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::{OrderCode, PaymentSession};

    #[test]
    fn initiate_request_accepts_legacy_order_type_name() {
        let json = r#"{"openid":"U1","amount":100,"data_platform_order_type":3}"#;
        let req: InitiatePaymentRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.order_type, 3);
        assert_eq!(req.openid, "U1");
    }

    #[test]
    fn initiate_request_accepts_order_type() {
        let json = r#"{"openid":"U1","amount":100,"order_type":1}"#;
        let req: InitiatePaymentRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.order_type, 1);
    }

    #[test]
    fn entitlement_request_parses_window_and_status() {
        let json = r#"{
            "openid": "U1",
            "status": "active",
            "grant_start": "2024-01-01T00:00:00Z",
            "grant_end": "2024-02-01T00:00:00Z",
            "granted_by": "ops"
        }"#;
        let req: EntitlementRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.status, Some(EntitlementStatus::Active));
        assert!(req.grant_start.unwrap().is_before(&req.grant_end.unwrap()));
    }

    #[test]
    fn entitlement_request_fields_default_to_none() {
        let req: EntitlementRequest = serde_json::from_str(r#"{"openid":"U1"}"#).unwrap();
        assert!(req.status.is_none());
        assert!(req.grant_start.is_none());
        assert!(req.granted_by.is_none());
    }

    #[test]
    fn bypassed_session_serializes_empty_fields() {
        let response = PaymentSessionResponse::from(InitiatePaymentResult {
            order_code: OrderCode::parse("OC1").unwrap(),
            session: PaymentSession::placeholder(),
            bypassed: true,
        });
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["pay_sign"], "");
        assert_eq!(json["package"], "");
        assert_eq!(json["order_code"], "OC1");
        assert_eq!(json["bypassed"], true);
    }

    #[test]
    fn notification_ack_uses_success_code() {
        let json = serde_json::to_value(NotificationAck::success("ignored")).unwrap();
        assert_eq!(json, serde_json::json!({"code": "SUCCESS", "message": "ignored"}));
    }
}
