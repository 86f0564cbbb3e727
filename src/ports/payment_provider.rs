//! Payment provider port for external payment processing.
//!
//! Defines the contract for the mobile-payment provider: opening a prepay
//! session the client can pay against, and turning a signed asynchronous
//! notification into trusted data.
//!
//! # Design
//!
//! - **Trust boundary**: `verify_notification` is the only way to obtain a
//!   `PaymentNotification`; unverified payloads never reach the core
//! - **Merchant settings in the adapter**: app id, merchant id, description,
//!   attach and callback URL are fixed per deployment

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, ErrorCode, OpenId};
use crate::domain::payment::{OrderCode, PaymentNotification, PaymentSession};

/// Port for payment provider integrations.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Register a prepay order with the provider and sign the client session.
    async fn create_prepay_session(
        &self,
        request: PrepayRequest,
    ) -> Result<PaymentSession, PaymentError>;

    /// Verify a notification's signature and decrypt its resource.
    ///
    /// Returns the trusted notification if valid, error otherwise.
    async fn verify_notification(
        &self,
        headers: &NotificationHeaders,
        body: &[u8],
    ) -> Result<PaymentNotification, PaymentError>;
}

/// Per-purchase part of a prepay request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrepayRequest {
    /// Sent as the provider's out-trade-no.
    pub order_code: OrderCode,

    /// Amount in the smallest currency unit (fen).
    pub amount_total: i64,

    pub payer_open_id: OpenId,
}

/// Signature headers delivered with a notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationHeaders {
    /// Serial number of the platform certificate that signed the payload.
    pub serial: String,
    /// Unix seconds, as sent.
    pub timestamp: String,
    pub nonce: String,
    /// Base64 RSA signature.
    pub signature: String,
}

impl NotificationHeaders {
    pub const SERIAL: &'static str = "Wechatpay-Serial";
    pub const TIMESTAMP: &'static str = "Wechatpay-Timestamp";
    pub const NONCE: &'static str = "Wechatpay-Nonce";
    pub const SIGNATURE: &'static str = "Wechatpay-Signature";
}

/// Errors from payment provider operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentError {
    /// Error code for categorization.
    pub code: PaymentErrorCode,

    /// Human-readable message.
    pub message: String,

    /// Provider's error code (if available).
    pub provider_code: Option<String>,
}

impl PaymentError {
    /// Create a new payment error.
    pub fn new(code: PaymentErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
        }
    }

    /// Attach the provider's own error code.
    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::NetworkError, message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::AuthenticationError, message)
    }

    pub fn invalid_notification(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::InvalidNotification, message)
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::ProviderError, message)
    }

    /// Local signing or key material failure.
    pub fn crypto(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::CryptoError, message)
    }
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for PaymentError {}

impl From<PaymentError> for DomainError {
    fn from(err: PaymentError) -> Self {
        let code = match err.code {
            PaymentErrorCode::InvalidNotification => ErrorCode::ValidationFailed,
            PaymentErrorCode::CryptoError => ErrorCode::InternalError,
            _ => ErrorCode::ExternalServiceError,
        };

        DomainError::new(code, err.message)
    }
}

/// Payment error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentErrorCode {
    /// Network connectivity issue or timeout.
    NetworkError,

    /// Provider rejected our request signature or credentials.
    AuthenticationError,

    /// Notification failed signature, freshness or decryption checks.
    InvalidNotification,

    /// Local key material or signing failure.
    CryptoError,

    /// Provider API error.
    ProviderError,
}

impl std::fmt::Display for PaymentErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentErrorCode::NetworkError => "network_error",
            PaymentErrorCode::AuthenticationError => "authentication_error",
            PaymentErrorCode::InvalidNotification => "invalid_notification",
            PaymentErrorCode::CryptoError => "crypto_error",
            PaymentErrorCode::ProviderError => "provider_error",
        };
        write!(f, "{}", s)
    }
}
