//! Payment configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::ledger::is_http_url;

const API_V3_KEY_LEN: usize = 32;

/// Payment configuration (WeChat Pay merchant account)
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Mini-program / official account app id
    pub app_id: String,

    /// Merchant id
    pub mch_id: String,

    /// Serial number of the merchant API certificate
    pub merchant_serial_no: String,

    /// Merchant private key (PKCS#8 PEM)
    pub private_key_path: String,

    /// APIv3 key used to decrypt notification resources
    pub api_v3_key: SecretString,

    /// Serial number of the platform key that signs notifications
    pub platform_serial_no: String,

    /// Platform public key (SPKI PEM)
    pub platform_public_key_path: String,

    /// Callback URL registered with each prepay request
    pub notify_url: String,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_description")]
    pub description: String,

    #[serde(default = "default_description")]
    pub attach: String,

    /// Provider request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl PaymentConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate payment configuration
    pub fn validate(&self, production: bool) -> Result<(), ValidationError> {
        let required = [
            (&self.app_id, "payment.app_id"),
            (&self.mch_id, "payment.mch_id"),
            (&self.merchant_serial_no, "payment.merchant_serial_no"),
            (&self.private_key_path, "payment.private_key_path"),
            (&self.platform_serial_no, "payment.platform_serial_no"),
            (&self.platform_public_key_path, "payment.platform_public_key_path"),
            (&self.notify_url, "payment.notify_url"),
        ];
        for (value, name) in required {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingRequired(name));
            }
        }

        if self.api_v3_key.expose_secret().len() != API_V3_KEY_LEN {
            return Err(ValidationError::InvalidApiV3Key);
        }
        if !is_http_url(&self.notify_url) {
            return Err(ValidationError::InvalidUrl("payment.notify_url"));
        }
        if production && !self.notify_url.starts_with("https://") {
            return Err(ValidationError::NotifyUrlMustBeHttps);
        }
        if !is_http_url(&self.api_base_url) {
            return Err(ValidationError::InvalidUrl("payment.api_base_url"));
        }
        if self.timeout_secs == 0 || self.timeout_secs > 120 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            mch_id: String::new(),
            merchant_serial_no: String::new(),
            private_key_path: String::new(),
            api_v3_key: SecretString::new(String::new()),
            platform_serial_no: String::new(),
            platform_public_key_path: String::new(),
            notify_url: String::new(),
            api_base_url: default_api_base_url(),
            description: default_description(),
            attach: default_description(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://api.mch.weixin.qq.com".to_string()
}

fn default_description() -> String {
    "Membership purchase".to_string()
}

fn default_timeout() -> u64 {
    10
}
