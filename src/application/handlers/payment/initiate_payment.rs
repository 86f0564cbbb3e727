//! InitiatePaymentHandler - Command handler for starting a purchase.
//!
//! Records the customer and order in the ledger, then either grants an
//! entitlement bypass or asks the payment provider for a prepay session.
//!
//! Ledger writes are best-effort: a failure is logged and the purchase
//! continues, so the ledger can briefly disagree with the provider.

use std::sync::Arc;

use crate::domain::foundation::{OpenId, ValidationError};
use crate::domain::payment::{OrderCode, OrderType, PaymentOrderError, PaymentSession};
use crate::ports::{OrderLedger, PaymentProvider, PrepayRequest};

use super::EntitlementEvaluator;

/// Source of fresh order codes.
pub type OrderCodeSource = fn() -> Result<OrderCode, rand::Error>;

/// Command to start a purchase.
#[derive(Debug, Clone)]
pub struct InitiatePaymentCommand {
    pub open_id: String,
    /// Amount in the smallest currency unit (fen).
    pub amount: i64,
    pub order_type: OrderType,
}

/// Result of a purchase request.
#[derive(Debug, Clone)]
pub struct InitiatePaymentResult {
    pub order_code: OrderCode,
    /// Placeholder session when `bypassed` is set.
    pub session: PaymentSession,
    pub bypassed: bool,
}

/// Handler for purchase requests.
pub struct InitiatePaymentHandler {
    ledger: Arc<dyn OrderLedger>,
    provider: Arc<dyn PaymentProvider>,
    evaluator: Arc<EntitlementEvaluator>,
    order_codes: OrderCodeSource,
}

impl InitiatePaymentHandler {
    pub fn new(
        ledger: Arc<dyn OrderLedger>,
        provider: Arc<dyn PaymentProvider>,
        evaluator: Arc<EntitlementEvaluator>,
    ) -> Self {
        Self {
            ledger,
            provider,
            evaluator,
            order_codes: OrderCode::generate,
        }
    }

    /// Replaces the order code source.
    pub fn with_order_code_source(mut self, order_codes: OrderCodeSource) -> Self {
        self.order_codes = order_codes;
        self
    }

    pub async fn handle(
        &self,
        cmd: InitiatePaymentCommand,
    ) -> Result<InitiatePaymentResult, PaymentOrderError> {
        // 1. Validate before any side effect
        let open_id = OpenId::new(cmd.open_id)?;
        if cmd.amount <= 0 {
            return Err(ValidationError::not_positive("amount", cmd.amount).into());
        }
        let order_type = cmd.order_type;

        // 2. Customer upsert
        if let Err(e) = self.ledger.save_customer(&open_id).await {
            tracing::warn!(%open_id, error = %e, "Ledger customer upsert failed");
        }

        // 3. Order code
        let order_code = (self.order_codes)().map_err(|e| {
            tracing::error!(%open_id, error = %e, "Order code generation failed");
            PaymentOrderError::internal("could not generate order code")
        })?;

        // 4. Order record
        if let Err(e) = self.ledger.save_order(&order_code, order_type, &open_id).await {
            tracing::warn!(%open_id, %order_code, %order_type, error = %e, "Ledger order save failed");
        }

        // 5. Entitlement bypass
        let decision = self.evaluator.evaluate(&open_id, order_type).await;
        if decision.is_bypass() {
            if let Err(e) = self.ledger.mark_order_paid(&order_code).await {
                tracing::warn!(%open_id, %order_code, error = %e, "Ledger mark-paid after bypass failed");
            }
            tracing::info!(%open_id, %order_code, %order_type, "Purchase completed by entitlement");
            return Ok(InitiatePaymentResult {
                order_code,
                session: PaymentSession::placeholder(),
                bypassed: true,
            });
        }

        // 6. Prepay session
        let session = self
            .provider
            .create_prepay_session(PrepayRequest {
                order_code: order_code.clone(),
                amount_total: cmd.amount,
                payer_open_id: open_id.clone(),
            })
            .await
            .map_err(|e| {
                tracing::error!(%open_id, %order_code, error = %e, "Prepay request failed");
                PaymentOrderError::provider(e.message)
            })?;

        tracing::info!(%open_id, %order_code, %order_type, amount = cmd.amount, "Prepay session issued");

        Ok(InitiatePaymentResult {
            order_code,
            session,
            bypassed: false,
        })
    }
}
