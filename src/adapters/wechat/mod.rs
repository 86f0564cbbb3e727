//! WeChat Pay payment provider adapter.
//!
//! Implements the `PaymentProvider` port for WeChat Pay API v3 (JSAPI), including:
//! - Prepay order creation with signed request authorization
//! - Client payment session signing
//! - Notification signature verification and resource decryption
//!
//! # Security
//!
//! - Requests and sessions are signed with RSA-SHA256 (merchant private key)
//! - Notifications are verified with the platform public key and a 5-minute
//!   timestamp window, then decrypted with AES-256-GCM (APIv3 key)
//! - All secrets are handled via `secrecy::SecretString`

mod crypto;
mod mock_payment_provider;
mod wechat_adapter;
mod wire_types;

pub use mock_payment_provider::{MethodCall, MockPaymentProvider};
pub use wechat_adapter::{WechatPayAdapter, WechatPayConfig, DEFAULT_API_BASE_URL, JSAPI_PREPAY_PATH};
