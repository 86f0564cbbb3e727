//! HTTP client for the ledger service.
//!
//! `LedgerClient` is a thin JSON poster over a fixed set of endpoints;
//! `HttpOrderLedger` implements the `OrderLedger` port on top of it.
//!
//! # Behavior
//!
//! - `POST {base_url}{path}` with `Content-Type: application/json`
//! - Non-2xx statuses and transport failures become `LedgerError`
//! - No retries; a per-request timeout bounds every call

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;

use crate::domain::foundation::OpenId;
use crate::domain::payment::{OrderCode, OrderType};
use crate::ports::{LedgerError, OrderLedger};

/// Member type sent on customer upsert (regular customer).
const REGULAR_MEMBER_TYPE: &str = "0";

/// Endpoints this service is allowed to call on the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerEndpoint {
    SaveCustomer,
    SaveOrder,
    EditOrderStatus,
}

impl LedgerEndpoint {
    pub fn path(&self) -> &'static str {
        match self {
            LedgerEndpoint::SaveCustomer => "/ysCustomer/save",
            LedgerEndpoint::SaveOrder => "/ysOrder/save",
            LedgerEndpoint::EditOrderStatus => "/ysOrder/editOrderStatus",
        }
    }
}

/// Customer upsert body.
#[derive(Debug, Serialize)]
struct CustomerParam<'a> {
    #[serde(rename = "memberType")]
    member_type: &'a str,
    username: &'a str,
}

/// Order create and status edit body.
#[derive(Debug, Serialize)]
struct OrderParam<'a> {
    #[serde(rename = "orderCode")]
    order_code: &'a str,
    #[serde(rename = "orderType", skip_serializing_if = "Option::is_none")]
    order_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
}

/// Raw JSON poster for the ledger.
#[derive(Clone)]
pub struct LedgerClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl LedgerClient {
    /// `base_url` includes any path prefix, e.g. `http://host/utility-project`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, LedgerError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LedgerError::Transport(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
        })
    }

    /// Posts `body` to `endpoint` and returns the response body verbatim.
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        endpoint: LedgerEndpoint,
        body: &B,
    ) -> Result<String, LedgerError> {
        let payload = serde_json::to_string(body).map_err(|e| LedgerError::Encode(e.to_string()))?;
        let url = format!("{}{}", self.base_url, endpoint.path());

        let response = self
            .http_client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(LedgerError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        tracing::debug!(endpoint = endpoint.path(), response = %text, "Ledger call succeeded");
        Ok(text)
    }
}

/// `OrderLedger` over HTTP.
#[derive(Clone)]
pub struct HttpOrderLedger {
    client: LedgerClient,
}

impl HttpOrderLedger {
    pub fn new(client: LedgerClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl OrderLedger for HttpOrderLedger {
    async fn save_customer(&self, open_id: &OpenId) -> Result<(), LedgerError> {
        let body = CustomerParam {
            member_type: REGULAR_MEMBER_TYPE,
            username: open_id.as_str(),
        };
        self.client.post(LedgerEndpoint::SaveCustomer, &body).await?;
        Ok(())
    }

    async fn save_order(
        &self,
        order_code: &OrderCode,
        order_type: OrderType,
        open_id: &OpenId,
    ) -> Result<(), LedgerError> {
        let body = OrderParam {
            order_code: order_code.as_str(),
            order_type: Some(order_type.to_string()),
            username: Some(open_id.as_str()),
        };
        self.client.post(LedgerEndpoint::SaveOrder, &body).await?;
        Ok(())
    }

    async fn mark_order_paid(&self, order_code: &OrderCode) -> Result<(), LedgerError> {
        let body = OrderParam {
            order_code: order_code.as_str(),
            order_type: None,
            username: None,
        };
        self.client.post(LedgerEndpoint::EditOrderStatus, &body).await?;
        Ok(())
    }
}
