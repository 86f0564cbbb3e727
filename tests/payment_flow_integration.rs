//! End-to-end tests for the payment HTTP surface.
//!
//! Drives the full axum router with `tower::ServiceExt::oneshot`. The ledger
//! and the provider API are either in-memory or `wiremock` servers; the WeChat
//! adapter runs for real against keys generated for the test run.

use std::sync::Arc;
use std::time::Duration;

use aes_gcm::aead::{Aead, KeyInit, Payload};
use async_trait::async_trait;
use aes_gcm::{Aes256Gcm, Nonce};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use http_body_util::BodyExt;
use once_cell::sync::Lazy;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::signature::{SignatureEncoding, Signer};
use rsa::{RsaPrivateKey, RsaPublicKey};
use secrecy::SecretString;
use serde_json::{json, Value};
use sha2::Sha256;
use tower::ServiceExt;
use wiremock::matchers::{body_json, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use prepay_gateway::adapters::http::{app_router, PaymentAppState, ADMIN_TOKEN_HEADER};
use prepay_gateway::adapters::ledger::{HttpOrderLedger, InMemoryLedger, LedgerCall, LedgerClient};
use prepay_gateway::adapters::memory::{
    InMemoryEntitlementStore, InMemoryProcessedNotificationStore,
};
use prepay_gateway::adapters::wechat::{MockPaymentProvider, WechatPayAdapter, WechatPayConfig};
use prepay_gateway::domain::entitlement::{Entitlement, EntitlementPolicy};
use prepay_gateway::domain::foundation::{OpenId, Timestamp};
use prepay_gateway::domain::payment::{OrderCode, OrderStatus, OrderType};
use prepay_gateway::ports::{LedgerError, OrderLedger, PaymentProvider};

// =============================================================================
// Test Infrastructure
// =============================================================================

const API_V3_KEY: &str = "0123456789abcdef0123456789abcdef";
const PLATFORM_SERIAL: &str = "PUB_KEY_ID_TEST";
const ADMIN_TOKEN: &str = "admin-secret";
const NOTIFY_PATH: &str = "/wx_payment_notify/jsapi_notify_url";

struct TestKeys {
    private: RsaPrivateKey,
    private_pem: String,
    public_pem: String,
}

static KEYS: Lazy<TestKeys> = Lazy::new(|| {
    let private = RsaPrivateKey::new(&mut rand::rngs::OsRng, 1024).unwrap();
    let private_pem = private
        .to_pkcs8_pem(LineEnding::LF)
        .unwrap()
        .as_str()
        .to_owned();
    let public_pem = RsaPublicKey::from(&private)
        .to_public_key_pem(LineEnding::LF)
        .unwrap();
    TestKeys {
        private,
        private_pem,
        public_pem,
    }
});

fn wechat_adapter(api_base_url: &str) -> WechatPayAdapter {
    let config = WechatPayConfig {
        app_id: "wxtestapp0000001".to_string(),
        mch_id: "1900000001".to_string(),
        merchant_serial_no: "MERCHANT_SERIAL_TEST".to_string(),
        api_v3_key: SecretString::new(API_V3_KEY.to_string()),
        platform_serial_no: PLATFORM_SERIAL.to_string(),
        notify_url: format!("https://pay.example.com{}", NOTIFY_PATH),
        description: "Membership purchase".to_string(),
        attach: "Membership purchase".to_string(),
        api_base_url: api_base_url.to_string(),
        timeout: Duration::from_secs(5),
    };
    // One key pair plays both merchant and platform roles here.
    WechatPayAdapter::from_pem(config, &KEYS.private_pem, &KEYS.public_pem).unwrap()
}

fn app(
    ledger: Arc<dyn OrderLedger>,
    provider: Arc<dyn PaymentProvider>,
    entitlements: Arc<InMemoryEntitlementStore>,
) -> Router {
    let state = PaymentAppState {
        ledger,
        payment_provider: provider,
        entitlement_reader: entitlements.clone(),
        entitlement_repository: entitlements,
        processed_notifications: Arc::new(InMemoryProcessedNotificationStore::new()),
        entitlement_policy: EntitlementPolicy::default(),
        admin_token: Some(SecretString::new(ADMIN_TOKEN.to_string())),
    };
    app_router(state, &[], Duration::from_secs(5))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn admin_post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header(ADMIN_TOKEN_HEADER, ADMIN_TOKEN)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn open_window(open_id: &str) -> Entitlement {
    let t0 = Timestamp::now().plus_secs(-100);
    Entitlement::grant(OpenId::new(open_id).unwrap(), t0, t0.plus_secs(3600), None).unwrap()
}

/// Provider notification with an encrypted resource.
fn notification_body(out_trade_no: &str, trade_state: &str) -> String {
    let transaction = json!({
        "out_trade_no": out_trade_no,
        "transaction_id": "4200000000202401010000000001",
        "trade_state": trade_state,
        "payer": { "openid": "U1" },
        "amount": { "total": 100, "payer_total": 100, "currency": "CNY" }
    });
    let nonce = "0123456789ab";
    let cipher = Aes256Gcm::new_from_slice(API_V3_KEY.as_bytes()).unwrap();
    let ciphertext = cipher
        .encrypt(
            Nonce::from_slice(nonce.as_bytes()),
            Payload {
                msg: transaction.to_string().as_bytes(),
                aad: b"transaction",
            },
        )
        .unwrap();

    json!({
        "id": "EV-2024-0001",
        "create_time": "2024-01-01T00:00:00+08:00",
        "event_type": "TRANSACTION.SUCCESS",
        "resource_type": "encrypt-resource",
        "summary": "payment succeeded",
        "resource": {
            "algorithm": "AEAD_AES_256_GCM",
            "ciphertext": BASE64.encode(ciphertext),
            "associated_data": "transaction",
            "original_type": "transaction",
            "nonce": nonce
        }
    })
    .to_string()
}

fn notification_request(body: &str, signature: Option<String>) -> Request<Body> {
    let timestamp = chrono::Utc::now().timestamp().to_string();
    let nonce = "notifynonce";
    let signature = signature.unwrap_or_else(|| {
        let message = format!("{}\n{}\n{}\n", timestamp, nonce, body);
        let key = SigningKey::<Sha256>::new(KEYS.private.clone());
        BASE64.encode(key.sign(message.as_bytes()).to_bytes())
    });

    Request::builder()
        .method("POST")
        .uri(NOTIFY_PATH)
        .header("content-type", "application/json")
        .header("Wechatpay-Serial", PLATFORM_SERIAL)
        .header("Wechatpay-Timestamp", timestamp)
        .header("Wechatpay-Nonce", nonce)
        .header("Wechatpay-Signature", signature)
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn mount_ledger(server: &MockServer, edit_expectations: u64) {
    for endpoint in ["/utility-project/ysCustomer/save", "/utility-project/ysOrder/save"] {
        Mock::given(method("POST"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"code":200}"#))
            .mount(server)
            .await;
    }
    Mock::given(method("POST"))
        .and(path("/utility-project/ysOrder/editOrderStatus"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"code":200}"#))
        .expect(edit_expectations)
        .mount(server)
        .await;
}

fn http_ledger(server: &MockServer) -> Arc<HttpOrderLedger> {
    let client = LedgerClient::new(
        format!("{}/utility-project", server.uri()),
        Duration::from_secs(5),
    )
    .unwrap();
    Arc::new(HttpOrderLedger::new(client))
}

// =============================================================================
// Scenario A: entitled customer bypasses payment
// =============================================================================

#[tokio::test]
async fn entitled_customer_bypasses_provider_and_marks_order_paid() {
    let ledger_server = MockServer::start().await;
    mount_ledger(&ledger_server, 1).await;
    let provider = MockPaymentProvider::new();
    let entitlements = Arc::new(InMemoryEntitlementStore::with_records([open_window("U1")]));
    let app = app(
        http_ledger(&ledger_server),
        Arc::new(provider.clone()),
        entitlements,
    );

    let (status, body) = send(
        &app,
        post_json("/payment/jsapi", json!({"openid": "U1", "amount": 100, "order_type": 3})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bypassed"], true);
    assert_eq!(body["pay_sign"], "");
    assert_eq!(body["package"], "");
    assert!(!provider.was_called("create_prepay_session"));

    let order_code = body["order_code"].as_str().unwrap().to_string();
    let edits: Vec<Value> = ledger_server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path().ends_with("/ysOrder/editOrderStatus"))
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect();
    assert_eq!(edits, vec![json!({ "orderCode": order_code })]);
    ledger_server.verify().await;
}

// =============================================================================
// Scenario B: no entitlement, provider prepay issued
// =============================================================================

#[tokio::test]
async fn customer_without_entitlement_receives_signed_prepay_session() {
    let provider_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/pay/transactions/jsapi"))
        .and(body_partial_json(json!({
            "amount": { "total": 100, "currency": "CNY" },
            "payer": { "openid": "U2" }
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "prepay_id": "wx201410272009395522657a690389285100" })),
        )
        .expect(1)
        .mount(&provider_server)
        .await;

    let ledger = Arc::new(InMemoryLedger::new());
    let app = app(
        ledger.clone(),
        Arc::new(wechat_adapter(&provider_server.uri())),
        Arc::new(InMemoryEntitlementStore::new()),
    );

    let (status, body) = send(
        &app,
        post_json(
            "/payment/jsapi",
            json!({"openid": "U2", "amount": 100, "data_platform_order_type": 3}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bypassed"], false);
    assert!(!body["pay_sign"].as_str().unwrap().is_empty());
    assert_eq!(body["package"], "prepay_id=wx201410272009395522657a690389285100");
    assert_eq!(body["sign_type"], "RSA");

    let order_code = OrderCode::parse(body["order_code"].as_str().unwrap()).unwrap();
    assert_eq!(ledger.order_status(&order_code), Some(OrderStatus::Created));
    assert_eq!(ledger.mark_paid_count(&order_code), 0);
    provider_server.verify().await;
}

#[tokio::test]
async fn provider_outage_returns_bad_gateway() {
    let provider_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/pay/transactions/jsapi"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(json!({ "code": "SYSTEM_ERROR", "message": "busy" })),
        )
        .mount(&provider_server)
        .await;
    let app = app(
        Arc::new(InMemoryLedger::new()),
        Arc::new(wechat_adapter(&provider_server.uri())),
        Arc::new(InMemoryEntitlementStore::new()),
    );

    let (status, body) = send(
        &app,
        post_json("/payment/jsapi", json!({"openid": "U2", "amount": 100, "order_type": 1})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error_code"], "EXTERNAL_SERVICE_ERROR");
}

#[tokio::test]
async fn invalid_purchase_input_is_rejected_before_side_effects() {
    let ledger = Arc::new(InMemoryLedger::new());
    let provider = MockPaymentProvider::new();
    let app = app(
        ledger.clone(),
        Arc::new(provider.clone()),
        Arc::new(InMemoryEntitlementStore::new()),
    );

    let (status, body) = send(
        &app,
        post_json("/payment/jsapi", json!({"openid": "U2", "amount": 0, "order_type": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "VALIDATION_FAILED");

    let (status, _) = send(
        &app,
        post_json("/payment/jsapi", json!({"openid": "", "amount": 100, "order_type": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, post_json("/payment/jsapi", json!({"openid": "U2"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(ledger.calls().is_empty());
    assert!(!provider.was_called("create_prepay_session"));
}

// =============================================================================
// Scenario C: webhook with invalid signature
// =============================================================================

#[tokio::test]
async fn notification_with_invalid_signature_is_acknowledged_without_ledger_call() {
    let ledger = Arc::new(InMemoryLedger::new());
    let app = app(
        ledger.clone(),
        Arc::new(wechat_adapter("http://127.0.0.1:9")),
        Arc::new(InMemoryEntitlementStore::new()),
    );
    let body = notification_body("OC1", "SUCCESS");
    let forged = BASE64.encode([7u8; 128]);

    let (status, ack) = send(&app, notification_request(&body, Some(forged))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["code"], "SUCCESS");
    assert_eq!(ack["message"], "rejected");
    assert!(ledger.calls().is_empty());
}

// =============================================================================
// Scenario D: verified successful notification
// =============================================================================

#[tokio::test]
async fn verified_notification_marks_order_paid_exactly_once() {
    let ledger_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/utility-project/ysOrder/editOrderStatus"))
        .and(body_json(json!({ "orderCode": "OC1" })))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"code":200}"#))
        .expect(1)
        .mount(&ledger_server)
        .await;
    let app = app(
        http_ledger(&ledger_server),
        Arc::new(wechat_adapter("http://127.0.0.1:9")),
        Arc::new(InMemoryEntitlementStore::new()),
    );
    let body = notification_body("OC1", "SUCCESS");

    let (status, ack) = send(&app, notification_request(&body, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["message"], "reconciled");

    // Provider redelivery
    let (status, ack) = send(&app, notification_request(&body, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["message"], "duplicate");

    ledger_server.verify().await;
}

#[tokio::test]
async fn verified_non_success_notification_is_ignored() {
    let ledger = Arc::new(InMemoryLedger::new());
    ledger
        .save_order(
            &OrderCode::parse("OC1").unwrap(),
            OrderType::new(1),
            &OpenId::new("U1").unwrap(),
        )
        .await
        .unwrap();
    let app = app(
        ledger.clone(),
        Arc::new(wechat_adapter("http://127.0.0.1:9")),
        Arc::new(InMemoryEntitlementStore::new()),
    );

    let (status, ack) = send(&app, notification_request(&notification_body("OC1", "CLOSED"), None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["message"], "ignored");
    assert_eq!(ledger.mark_paid_count(&OrderCode::parse("OC1").unwrap()), 0);
}

// =============================================================================
// Entitlement administration
// =============================================================================

#[tokio::test]
async fn admin_grant_takes_effect_on_next_purchase() {
    let ledger = Arc::new(InMemoryLedger::new());
    let provider = MockPaymentProvider::new();
    let app = app(
        ledger.clone(),
        Arc::new(provider.clone()),
        Arc::new(InMemoryEntitlementStore::new()),
    );
    let now = Timestamp::now();

    let (status, _) = send(
        &app,
        admin_post(
            "/platform/whitelist_insert",
            json!({
                "openid": "U1",
                "status": "active",
                "grant_start": now.plus_secs(-60),
                "grant_end": now.plus_secs(3600),
                "granted_by": "ops"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = send(
        &app,
        post_json("/payment/jsapi", json!({"openid": "U1", "amount": 100, "order_type": 3})),
    )
    .await;
    assert_eq!(body["bypassed"], true);
    assert!(!provider.was_called("create_prepay_session"));
    assert!(ledger
        .calls()
        .iter()
        .any(|c| matches!(c, LedgerCall::MarkOrderPaid(_))));

    let (status, record) = send(
        &app,
        admin_post("/platform/whitelist_query", json!({"openid": "U1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["status"], "active");
    assert_eq!(record["granted_by"], "ops");

    let (status, _) = send(
        &app,
        admin_post("/platform/whitelist_delete", json!({"openid": "U1"})),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(
        &app,
        admin_post("/platform/whitelist_query", json!({"openid": "U1"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_code"], "ENTITLEMENT_NOT_FOUND");
}

#[tokio::test]
async fn admin_routes_require_token() {
    let app = app(
        Arc::new(InMemoryLedger::new()),
        Arc::new(MockPaymentProvider::new()),
        Arc::new(InMemoryEntitlementStore::new()),
    );

    let (status, body) = send(
        &app,
        post_json("/platform/whitelist_query", json!({"openid": "U1"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error_code"], "UNAUTHORIZED");

    let wrong = Request::builder()
        .method("POST")
        .uri("/platform/whitelist_query")
        .header("content-type", "application/json")
        .header(ADMIN_TOKEN_HEADER, "admin-secreT")
        .body(Body::from(json!({"openid": "U1"}).to_string()))
        .unwrap();
    let (status, _) = send(&app, wrong).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn update_of_missing_entitlement_is_not_found() {
    let app = app(
        Arc::new(InMemoryLedger::new()),
        Arc::new(MockPaymentProvider::new()),
        Arc::new(InMemoryEntitlementStore::new()),
    );

    let (status, _) = send(
        &app,
        admin_post("/platform/whitelist_update", json!({"openid": "U9", "status": "inactive"})),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_reports_ok() {
    let app = app(
        Arc::new(InMemoryLedger::new()),
        Arc::new(MockPaymentProvider::new()),
        Arc::new(InMemoryEntitlementStore::new()),
    );
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

// =============================================================================
// Request timeout
// =============================================================================

/// Ledger that answers every call after a fixed delay.
struct DelayedLedger {
    inner: InMemoryLedger,
    delay: Duration,
}

#[async_trait]
impl OrderLedger for DelayedLedger {
    async fn save_customer(&self, open_id: &OpenId) -> Result<(), LedgerError> {
        tokio::time::sleep(self.delay).await;
        self.inner.save_customer(open_id).await
    }

    async fn save_order(
        &self,
        order_code: &OrderCode,
        order_type: OrderType,
        open_id: &OpenId,
    ) -> Result<(), LedgerError> {
        tokio::time::sleep(self.delay).await;
        self.inner.save_order(order_code, order_type, open_id).await
    }

    async fn mark_order_paid(&self, order_code: &OrderCode) -> Result<(), LedgerError> {
        tokio::time::sleep(self.delay).await;
        self.inner.mark_order_paid(order_code).await
    }
}

fn delayed_app(ledger: Arc<DelayedLedger>, request_timeout: Duration) -> Router {
    let entitlements = Arc::new(InMemoryEntitlementStore::new());
    let state = PaymentAppState {
        ledger,
        payment_provider: Arc::new(wechat_adapter("http://127.0.0.1:9")),
        entitlement_reader: entitlements.clone(),
        entitlement_repository: entitlements,
        processed_notifications: Arc::new(InMemoryProcessedNotificationStore::new()),
        entitlement_policy: EntitlementPolicy::default(),
        admin_token: None,
    };
    app_router(state, &[], request_timeout)
}

#[tokio::test]
async fn slow_ledger_edit_still_acknowledged_and_completed() {
    let code = OrderCode::parse("OC1").unwrap();
    let inner = InMemoryLedger::new();
    inner
        .save_order(&code, OrderType::new(1), &OpenId::new("U1").unwrap())
        .await
        .unwrap();
    let ledger = Arc::new(DelayedLedger {
        inner,
        delay: Duration::from_millis(1500),
    });
    let app = delayed_app(ledger.clone(), Duration::from_secs(1));

    let body = notification_body("OC1", "SUCCESS");
    let (status, ack) = send(&app, notification_request(&body, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["code"], "SUCCESS");
    assert_eq!(ack["message"], "reconciled");
    assert_eq!(ledger.inner.order_status(&code), Some(OrderStatus::Paid));
}

#[tokio::test]
async fn slow_purchase_is_cut_off_by_request_timeout() {
    let ledger = Arc::new(DelayedLedger {
        inner: InMemoryLedger::new(),
        delay: Duration::from_millis(1500),
    });
    let app = delayed_app(ledger, Duration::from_secs(1));

    let response = app
        .oneshot(post_json(
            "/payment/jsapi",
            json!({"openid": "U1", "amount": 100, "order_type": 1}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
}
