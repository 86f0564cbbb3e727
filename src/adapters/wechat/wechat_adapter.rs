//! WeChat Pay v3 payment provider adapter.
//!
//! Implements the `PaymentProvider` trait for the JSAPI (mini-program) flow:
//! prepay order creation, client session signing and notification
//! verification.
//!
//! # Security
//!
//! - Requests carry a `WECHATPAY2-SHA256-RSA2048` authorization signed with
//!   the merchant private key
//! - Notifications must come from the configured platform certificate serial,
//!   be fresh (5-minute window) and carry a valid platform signature
//! - The APIv3 key is held in `secrecy::SecretString`
//!
//! # Configuration
//!
//! ```ignore
//! let adapter = WechatPayAdapter::from_key_files(config, "apiclient_key.pem", "platform_pub.pem")?;
//! ```

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use secrecy::{ExposeSecret, SecretString};

use crate::domain::foundation::OpenId;
use crate::domain::payment::{OrderCode, PaymentNotification, PaymentSession, TradeState};
use crate::ports::{
    NotificationHeaders, PaymentError, PaymentErrorCode, PaymentProvider, PrepayRequest,
};

use super::crypto::{decrypt_resource, generate_nonce, MerchantSigner, PlatformVerifier};
use super::wire_types::{
    ApiErrorBody, EncryptedResource, JsapiPrepayBody, JsapiPrepayResponse, NotifyEnvelope,
    NotifyTransaction, Payer, PrepayAmount,
};

/// JSAPI prepay endpoint path.
pub const JSAPI_PREPAY_PATH: &str = "/v3/pay/transactions/jsapi";

/// Production API host.
pub const DEFAULT_API_BASE_URL: &str = "https://api.mch.weixin.qq.com";

const AUTH_SCHEMA: &str = "WECHATPAY2-SHA256-RSA2048";

const SIGN_TYPE: &str = "RSA";

const CURRENCY: &str = "CNY";

/// Maximum age for notifications (5 minutes).
const MAX_TIMESTAMP_AGE_SECS: i64 = 300;

/// Clock skew tolerance for future timestamps (60 seconds).
const MAX_FUTURE_TOLERANCE_SECS: i64 = 60;

/// Merchant settings for the WeChat Pay adapter.
#[derive(Clone)]
pub struct WechatPayConfig {
    pub app_id: String,
    pub mch_id: String,
    /// Serial number of the merchant API certificate.
    pub merchant_serial_no: String,
    /// 32-byte APIv3 key.
    pub api_v3_key: SecretString,
    /// Serial number of the platform certificate that signs notifications.
    pub platform_serial_no: String,
    pub notify_url: String,
    pub description: String,
    pub attach: String,
    pub api_base_url: String,
    pub timeout: Duration,
}

impl WechatPayConfig {
    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

/// WeChat Pay payment provider adapter.
pub struct WechatPayAdapter {
    config: WechatPayConfig,
    signer: MerchantSigner,
    verifier: PlatformVerifier,
    http_client: reqwest::Client,
}

impl WechatPayAdapter {
    /// Create an adapter from PEM-encoded key material.
    pub fn from_pem(
        config: WechatPayConfig,
        merchant_private_key_pem: &str,
        platform_public_key_pem: &str,
    ) -> Result<Self, PaymentError> {
        let signer = MerchantSigner::from_pem(merchant_private_key_pem)?;
        let verifier = PlatformVerifier::from_pem(platform_public_key_pem)?;

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("prepay-gateway/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PaymentError::network(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            config,
            signer,
            verifier,
            http_client,
        })
    }

    /// Create an adapter, reading both keys from disk.
    pub fn from_key_files(
        config: WechatPayConfig,
        merchant_private_key_path: impl AsRef<Path>,
        platform_public_key_path: impl AsRef<Path>,
    ) -> Result<Self, PaymentError> {
        let private_pem = read_key_file(merchant_private_key_path.as_ref())?;
        let public_pem = read_key_file(platform_public_key_path.as_ref())?;
        Self::from_pem(config, &private_pem, &public_pem)
    }

    /// Builds the `Authorization` header for an API request.
    fn authorization(
        &self,
        method: &str,
        url_path: &str,
        body: &str,
        timestamp: &str,
        nonce: &str,
    ) -> Result<String, PaymentError> {
        let message = format!("{}\n{}\n{}\n{}\n{}\n", method, url_path, timestamp, nonce, body);
        let signature = self.signer.sign(&message)?;
        Ok(format!(
            r#"{} mchid="{}",nonce_str="{}",signature="{}",timestamp="{}",serial_no="{}""#,
            AUTH_SCHEMA, self.config.mch_id, nonce, signature, timestamp, self.config.merchant_serial_no
        ))
    }

    /// Signs the parameters the client passes to `requestPayment`.
    fn sign_client_session(&self, prepay_id: &str) -> Result<PaymentSession, PaymentError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let nonce_str = generate_nonce();
        let package = format!("prepay_id={}", prepay_id);

        let message = format!(
            "{}\n{}\n{}\n{}\n",
            self.config.app_id, timestamp, nonce_str, package
        );
        let pay_sign = self.signer.sign(&message)?;

        Ok(PaymentSession {
            timestamp,
            nonce_str,
            package,
            sign_type: SIGN_TYPE.to_string(),
            pay_sign,
        })
    }

    /// Verify notification signature headers against the body.
    ///
    /// # Security
    ///
    /// - Only the configured platform certificate serial is accepted
    /// - Validates timestamp to prevent replay attacks
    fn verify_signature_at(
        &self,
        headers: &NotificationHeaders,
        body: &[u8],
        now: i64,
    ) -> Result<(), PaymentError> {
        // 1. Certificate serial
        if !headers
            .serial
            .trim()
            .eq_ignore_ascii_case(self.config.platform_serial_no.trim())
        {
            tracing::warn!(serial = %headers.serial, "Notification signed by unknown platform certificate");
            return Err(PaymentError::invalid_notification(
                "Unknown platform certificate serial",
            ));
        }

        // 2. Timestamp (prevent replay attacks)
        let timestamp: i64 = headers.timestamp.trim().parse().map_err(|_| {
            PaymentError::invalid_notification("Invalid notification timestamp")
        })?;
        let age = now - timestamp;

        if age > MAX_TIMESTAMP_AGE_SECS {
            tracing::warn!(
                event_timestamp = timestamp,
                current_time = now,
                age_secs = age,
                "Notification too old - possible replay attack"
            );
            return Err(PaymentError::invalid_notification(format!(
                "Notification too old ({} seconds)",
                age
            )));
        }

        if age < -MAX_FUTURE_TOLERANCE_SECS {
            tracing::warn!(
                event_timestamp = timestamp,
                current_time = now,
                "Notification from future - clock skew or manipulation"
            );
            return Err(PaymentError::invalid_notification(
                "Notification timestamp in future",
            ));
        }

        // 3. Platform signature
        let body = std::str::from_utf8(body)
            .map_err(|_| PaymentError::invalid_notification("Notification body is not UTF-8"))?;
        let message = format!("{}\n{}\n{}\n", headers.timestamp, headers.nonce, body);

        if !self.verifier.verify(&message, &headers.signature) {
            tracing::warn!("Invalid notification signature");
            return Err(PaymentError::invalid_notification("Invalid signature"));
        }

        Ok(())
    }

    /// Decrypt the resource and convert it to the domain notification.
    fn decrypt_notification(&self, body: &[u8]) -> Result<PaymentNotification, PaymentError> {
        let envelope: NotifyEnvelope = serde_json::from_slice(body).map_err(|e| {
            tracing::warn!(error = %e, "Failed to parse notification envelope");
            PaymentError::invalid_notification(format!("Invalid JSON: {}", e))
        })?;

        let resource = &envelope.resource;
        if resource.algorithm != EncryptedResource::ALGORITHM {
            return Err(PaymentError::invalid_notification(format!(
                "Unsupported resource algorithm: {}",
                resource.algorithm
            )));
        }

        let plaintext = decrypt_resource(
            self.config.api_v3_key.expose_secret().as_bytes(),
            &resource.nonce,
            &resource.associated_data,
            &resource.ciphertext,
        )?;

        let transaction: NotifyTransaction = serde_json::from_slice(&plaintext).map_err(|e| {
            PaymentError::invalid_notification(format!("Invalid transaction resource: {}", e))
        })?;

        let order_code = OrderCode::parse(transaction.out_trade_no)
            .map_err(|e| PaymentError::invalid_notification(e.to_string()))?;

        Ok(PaymentNotification {
            event_id: envelope.id,
            event_type: envelope.event_type,
            trade_state: TradeState::from(transaction.trade_state),
            order_code,
            payer_open_id: transaction.payer.and_then(|p| OpenId::new(p.openid).ok()),
            transaction_id: transaction.transaction_id,
            amount_total: transaction.amount.map(|a| a.total),
        })
    }
}

fn read_key_file(path: &Path) -> Result<String, PaymentError> {
    std::fs::read_to_string(path).map_err(|e| {
        PaymentError::crypto(format!("Cannot read key file {}: {}", path.display(), e))
    })
}

#[async_trait]
impl PaymentProvider for WechatPayAdapter {
    async fn create_prepay_session(
        &self,
        request: PrepayRequest,
    ) -> Result<PaymentSession, PaymentError> {
        let body = JsapiPrepayBody {
            appid: self.config.app_id.clone(),
            mchid: self.config.mch_id.clone(),
            description: self.config.description.clone(),
            out_trade_no: request.order_code.as_str().to_string(),
            attach: self.config.attach.clone(),
            notify_url: self.config.notify_url.clone(),
            amount: PrepayAmount {
                total: request.amount_total,
                currency: CURRENCY.to_string(),
            },
            payer: Payer {
                openid: request.payer_open_id.as_str().to_string(),
            },
        };
        let body_json = serde_json::to_string(&body).map_err(|e| {
            PaymentError::provider(format!("Failed to encode prepay request: {}", e))
        })?;

        let timestamp = chrono::Utc::now().timestamp().to_string();
        let nonce = generate_nonce();
        let authorization =
            self.authorization("POST", JSAPI_PREPAY_PATH, &body_json, &timestamp, &nonce)?;

        let url = format!("{}{}", self.config.api_base_url, JSAPI_PREPAY_PATH);
        let response = self
            .http_client
            .post(&url)
            .header(AUTHORIZATION, authorization)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(body_json)
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(
                status = status.as_u16(),
                order_code = %request.order_code,
                error = %error_text,
                "WeChat Pay prepay failed"
            );

            let code = if status == reqwest::StatusCode::UNAUTHORIZED {
                PaymentErrorCode::AuthenticationError
            } else {
                PaymentErrorCode::ProviderError
            };
            return Err(match serde_json::from_str::<ApiErrorBody>(&error_text) {
                Ok(api_error) => PaymentError::new(code, api_error.message)
                    .with_provider_code(api_error.code),
                Err(_) => PaymentError::new(
                    code,
                    format!("WeChat Pay API error: HTTP {}", status.as_u16()),
                ),
            });
        }

        let prepay: JsapiPrepayResponse = response.json().await.map_err(|e| {
            PaymentError::provider(format!("Failed to parse WeChat Pay response: {}", e))
        })?;

        tracing::info!(order_code = %request.order_code, "Prepay session created");

        self.sign_client_session(&prepay.prepay_id)
    }

    async fn verify_notification(
        &self,
        headers: &NotificationHeaders,
        body: &[u8],
    ) -> Result<PaymentNotification, PaymentError> {
        self.verify_signature_at(headers, body, chrono::Utc::now().timestamp())?;
        self.decrypt_notification(body)
    }
}
