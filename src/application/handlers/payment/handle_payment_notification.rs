//! HandlePaymentNotificationHandler - reconciles provider payment callbacks.
//!
//! The provider expects an acknowledgement whatever happens here, so the
//! handler never fails: every path resolves to a `NotificationOutcome`.

use std::sync::Arc;

use crate::domain::payment::{OrderCode, TradeState};
use crate::ports::{NotificationHeaders, OrderLedger, PaymentProvider, ProcessedNotificationStore};

/// Command carrying a raw provider callback.
#[derive(Debug, Clone)]
pub struct HandlePaymentNotificationCommand {
    pub headers: NotificationHeaders,
    /// Raw request body, exactly as received.
    pub body: Vec<u8>,
}

/// Result of notification processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    /// Order marked paid in the ledger.
    Reconciled { order_code: OrderCode },
    /// Order was already reconciled; nothing sent to the ledger.
    Duplicate { order_code: OrderCode },
    /// Verified, but the trade did not succeed.
    Ignored {
        order_code: OrderCode,
        trade_state: TradeState,
    },
    /// Signature, freshness or decryption check failed.
    Rejected { reason: String },
    /// Ledger edit failed; the order is left for a redelivery.
    LedgerFailed { order_code: OrderCode, reason: String },
}

impl NotificationOutcome {
    /// Short label for logs and response messages.
    pub fn label(&self) -> &'static str {
        match self {
            NotificationOutcome::Reconciled { .. } => "reconciled",
            NotificationOutcome::Duplicate { .. } => "duplicate",
            NotificationOutcome::Ignored { .. } => "ignored",
            NotificationOutcome::Rejected { .. } => "rejected",
            NotificationOutcome::LedgerFailed { .. } => "ledger_failed",
        }
    }
}

/// Handler for provider payment notifications.
pub struct HandlePaymentNotificationHandler {
    provider: Arc<dyn PaymentProvider>,
    ledger: Arc<dyn OrderLedger>,
    processed: Arc<dyn ProcessedNotificationStore>,
}

impl HandlePaymentNotificationHandler {
    pub fn new(
        provider: Arc<dyn PaymentProvider>,
        ledger: Arc<dyn OrderLedger>,
        processed: Arc<dyn ProcessedNotificationStore>,
    ) -> Self {
        Self {
            provider,
            ledger,
            processed,
        }
    }

    pub async fn handle(&self, cmd: HandlePaymentNotificationCommand) -> NotificationOutcome {
        // 1. Verify and decrypt
        let notification = match self.provider.verify_notification(&cmd.headers, &cmd.body).await {
            Ok(notification) => notification,
            Err(e) => {
                tracing::warn!(
                    serial = %cmd.headers.serial,
                    error = %e,
                    "Rejected payment notification"
                );
                return NotificationOutcome::Rejected { reason: e.message };
            }
        };
        let order_code = notification.order_code;

        // 2. Only successful trades change state
        if !notification.trade_state.is_success() {
            tracing::info!(
                %order_code,
                trade_state = %notification.trade_state,
                "Payment notification ignored"
            );
            return NotificationOutcome::Ignored {
                order_code,
                trade_state: notification.trade_state,
            };
        }

        // 3. Claim the order code
        let claimed = match self.processed.try_claim(&order_code).await {
            Ok(true) => true,
            Ok(false) => {
                tracing::info!(%order_code, "Duplicate payment notification");
                return NotificationOutcome::Duplicate { order_code };
            }
            Err(e) => {
                tracing::warn!(%order_code, error = %e, "Dedup claim failed, continuing");
                false
            }
        };

        // 4. Ledger edit
        if let Err(e) = self.ledger.mark_order_paid(&order_code).await {
            tracing::error!(%order_code, error = %e, "Ledger mark-paid failed");
            if claimed {
                if let Err(release_err) = self.processed.release(&order_code).await {
                    tracing::warn!(%order_code, error = %release_err, "Could not release dedup claim");
                }
            }
            return NotificationOutcome::LedgerFailed {
                order_code,
                reason: e.to_string(),
            };
        }

        // Record late when the store was unreachable at claim time
        if !claimed {
            if let Err(e) = self.processed.try_claim(&order_code).await {
                tracing::warn!(%order_code, error = %e, "Could not record processed notification");
            }
        }

        tracing::info!(
            %order_code,
            payer = ?notification.payer_open_id,
            transaction_id = ?notification.transaction_id,
            "Order reconciled as paid"
        );
        NotificationOutcome::Reconciled { order_code }
    }
}
