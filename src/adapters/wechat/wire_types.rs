//! WeChat Pay v3 wire types.
//!
//! These types mirror the provider's JSON as it is sent and received. They
//! are converted to domain types before leaving the adapter.

use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════════════════
// Prepay (JSAPI)
// ════════════════════════════════════════════════════════════════════════════════

/// Body of `POST /v3/pay/transactions/jsapi`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JsapiPrepayBody {
    pub appid: String,
    pub mchid: String,
    pub description: String,
    pub out_trade_no: String,
    pub attach: String,
    pub notify_url: String,
    pub amount: PrepayAmount,
    pub payer: Payer,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PrepayAmount {
    pub total: i64,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Payer {
    pub openid: String,
}

/// Successful prepay response.
#[derive(Debug, Clone, Deserialize)]
pub struct JsapiPrepayResponse {
    pub prepay_id: String,
}

/// Error body returned with non-2xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Notifications
// ════════════════════════════════════════════════════════════════════════════════

/// Outer notification envelope. Only `resource` carries transaction data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyEnvelope {
    pub id: String,
    #[serde(default)]
    pub create_time: String,
    pub event_type: String,
    #[serde(default)]
    pub resource_type: String,
    pub resource: EncryptedResource,
    #[serde(default)]
    pub summary: String,
}

/// AES-256-GCM encrypted payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedResource {
    pub algorithm: String,
    pub ciphertext: String,
    #[serde(default)]
    pub associated_data: String,
    #[serde(default)]
    pub original_type: String,
    pub nonce: String,
}

impl EncryptedResource {
    pub const ALGORITHM: &'static str = "AEAD_AES_256_GCM";
}

/// Decrypted transaction resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyTransaction {
    pub out_trade_no: String,
    #[serde(default)]
    pub transaction_id: Option<String>,
    pub trade_state: String,
    #[serde(default)]
    pub payer: Option<Payer>,
    #[serde(default)]
    pub amount: Option<NotifyAmount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyAmount {
    pub total: i64,
    #[serde(default)]
    pub payer_total: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
}
