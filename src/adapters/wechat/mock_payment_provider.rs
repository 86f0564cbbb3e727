//! Mock payment provider for testing.
//!
//! Provides a configurable mock implementation of `PaymentProvider` for unit
//! and integration tests. Supports:
//! - Pre-configured sessions and notifications
//! - Error injection
//! - Call tracking
//! - Plaintext notification bodies (no signature, no encryption)

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::foundation::OpenId;
use crate::domain::payment::{OrderCode, PaymentNotification, PaymentSession, TradeState};
use crate::ports::{NotificationHeaders, PaymentError, PaymentProvider, PrepayRequest};

use super::wire_types::NotifyTransaction;

/// Mock payment provider for testing.
///
/// # Example
///
/// ```ignore
/// let mock = MockPaymentProvider::new();
///
/// // Inject errors
/// mock.set_method_error("create_prepay_session", PaymentError::network("down"));
///
/// // Use in tests
/// let result = mock.create_prepay_session(request).await;
/// assert_eq!(mock.call_count("create_prepay_session"), 1);
/// ```
#[derive(Default)]
pub struct MockPaymentProvider {
    /// Inner state (thread-safe for async tests).
    inner: Arc<Mutex<MockState>>,
}

/// Internal mutable state.
#[derive(Default)]
struct MockState {
    /// Next session to return.
    next_session: Option<PaymentSession>,

    /// Next notification to return.
    next_notification: Option<PaymentNotification>,

    /// Error to return on next call.
    next_error: Option<PaymentError>,

    /// Specific errors by method name.
    method_errors: HashMap<String, PaymentError>,

    /// Track method calls for assertions.
    call_log: Vec<MethodCall>,

    /// Notification verification behavior.
    reject_notifications: bool,
}

/// Recorded method call for assertions.
#[derive(Debug, Clone)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

impl MockPaymentProvider {
    /// Create a new mock provider with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that fails all notification verifications.
    pub fn rejecting_notifications() -> Self {
        let mock = Self::new();
        mock.state().reject_notifications = true;
        mock
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Set the session to return from `create_prepay_session`.
    pub fn set_session(&self, session: PaymentSession) {
        self.state().next_session = Some(session);
    }

    /// Set the notification to return from `verify_notification`.
    pub fn set_notification(&self, notification: PaymentNotification) {
        self.state().next_notification = Some(notification);
    }

    /// Set an error to return on the next call to any method.
    pub fn set_error(&self, error: PaymentError) {
        self.state().next_error = Some(error);
    }

    /// Set an error for a specific method.
    pub fn set_method_error(&self, method: &str, error: PaymentError) {
        self.state().method_errors.insert(method.to_string(), error);
    }

    /// Clear all configured errors.
    pub fn clear_errors(&self) {
        let mut state = self.state();
        state.next_error = None;
        state.method_errors.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Call Tracking
    // ════════════════════════════════════════════════════════════════════════════

    /// Get all recorded method calls.
    pub fn calls(&self) -> Vec<MethodCall> {
        self.state().call_log.clone()
    }

    /// Check if a method was called.
    pub fn was_called(&self, method: &str) -> bool {
        self.state().call_log.iter().any(|c| c.method == method)
    }

    /// Get count of calls to a method.
    pub fn call_count(&self, method: &str) -> usize {
        self.state()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Internal Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record_call(&self, method: &str, args: Vec<String>) {
        self.state().call_log.push(MethodCall {
            method: method.to_string(),
            args,
        });
    }

    fn check_error(&self, method: &str) -> Result<(), PaymentError> {
        let mut state = self.state();

        // Check method-specific error first
        if let Some(error) = state.method_errors.get(method) {
            return Err(error.clone());
        }

        // Check global error (consumes it)
        if let Some(error) = state.next_error.take() {
            return Err(error);
        }

        Ok(())
    }
}

impl Clone for MockPaymentProvider {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_prepay_session(
        &self,
        request: PrepayRequest,
    ) -> Result<PaymentSession, PaymentError> {
        self.record_call(
            "create_prepay_session",
            vec![
                request.order_code.to_string(),
                request.amount_total.to_string(),
                request.payer_open_id.to_string(),
            ],
        );
        self.check_error("create_prepay_session")?;

        let configured = self.state().next_session.clone();
        Ok(configured.unwrap_or_else(|| PaymentSession {
            timestamp: chrono::Utc::now().timestamp().to_string(),
            nonce_str: "mocknonce".to_string(),
            package: format!("prepay_id=mock_{}", request.order_code),
            sign_type: "RSA".to_string(),
            pay_sign: "mock-signature".to_string(),
        }))
    }

    async fn verify_notification(
        &self,
        headers: &NotificationHeaders,
        body: &[u8],
    ) -> Result<PaymentNotification, PaymentError> {
        self.record_call(
            "verify_notification",
            vec![
                headers.serial.clone(),
                String::from_utf8_lossy(body).chars().take(50).collect(),
            ],
        );
        self.check_error("verify_notification")?;

        let state = self.state();
        if state.reject_notifications {
            return Err(PaymentError::invalid_notification("Verification disabled"));
        }

        if let Some(notification) = &state.next_notification {
            return Ok(notification.clone());
        }

        // Treat the body as an already-decrypted transaction resource
        let transaction: NotifyTransaction = serde_json::from_slice(body)
            .map_err(|e| PaymentError::invalid_notification(e.to_string()))?;
        let order_code = OrderCode::parse(transaction.out_trade_no)
            .map_err(|e| PaymentError::invalid_notification(e.to_string()))?;

        Ok(PaymentNotification {
            event_id: "EV-mock".to_string(),
            event_type: "TRANSACTION.SUCCESS".to_string(),
            trade_state: TradeState::from(transaction.trade_state),
            order_code,
            payer_open_id: transaction.payer.and_then(|p| OpenId::new(p.openid).ok()),
            transaction_id: transaction.transaction_id,
            amount_total: transaction.amount.map(|a| a.total),
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Test Helpers
// ════════════════════════════════════════════════════════════════════════════════

impl MockPaymentProvider {
    /// Notification reporting a successful payment for `order_code`.
    pub fn success_notification(order_code: &OrderCode, open_id: &str) -> PaymentNotification {
        Self::notification(order_code, open_id, TradeState::Success)
    }

    /// Notification with an arbitrary trade state.
    pub fn notification(
        order_code: &OrderCode,
        open_id: &str,
        trade_state: TradeState,
    ) -> PaymentNotification {
        PaymentNotification {
            event_id: format!("EV-{}", order_code),
            event_type: "TRANSACTION.SUCCESS".to_string(),
            trade_state,
            order_code: order_code.clone(),
            payer_open_id: OpenId::new(open_id).ok(),
            transaction_id: Some(format!("TX-{}", order_code)),
            amount_total: Some(100),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::PaymentErrorCode;

    fn request() -> PrepayRequest {
        PrepayRequest {
            order_code: OrderCode::parse("OC1").unwrap(),
            amount_total: 100,
            payer_open_id: OpenId::new("U1").unwrap(),
        }
    }

    #[tokio::test]
    async fn prepay_returns_default_signed_session() {
        let mock = MockPaymentProvider::new();
        let session = mock.create_prepay_session(request()).await.unwrap();

        assert_eq!(session.package, "prepay_id=mock_OC1");
        assert!(!session.is_placeholder());
    }

    #[tokio::test]
    async fn set_session_returns_configured() {
        let mock = MockPaymentProvider::new();
        mock.set_session(PaymentSession {
            timestamp: "1".to_string(),
            nonce_str: "n".to_string(),
            package: "prepay_id=X".to_string(),
            sign_type: "RSA".to_string(),
            pay_sign: "s".to_string(),
        });

        let session = mock.create_prepay_session(request()).await.unwrap();
        assert_eq!(session.package, "prepay_id=X");
    }

    #[tokio::test]
    async fn method_error_only_affects_method() {
        let mock = MockPaymentProvider::new();
        mock.set_method_error("create_prepay_session", PaymentError::network("down"));

        assert!(mock.create_prepay_session(request()).await.is_err());

        let body = br#"{"out_trade_no":"OC1","trade_state":"SUCCESS"}"#;
        assert!(mock
            .verify_notification(&NotificationHeaders::default(), body)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn next_error_is_consumed() {
        let mock = MockPaymentProvider::new();
        mock.set_error(PaymentError::provider("once"));

        assert!(mock.create_prepay_session(request()).await.is_err());
        assert!(mock.create_prepay_session(request()).await.is_ok());
    }

    #[tokio::test]
    async fn tracks_method_calls() {
        let mock = MockPaymentProvider::new();
        mock.create_prepay_session(request()).await.unwrap();

        assert!(mock.was_called("create_prepay_session"));
        assert_eq!(mock.call_count("create_prepay_session"), 1);
        assert_eq!(mock.calls()[0].args, vec!["OC1", "100", "U1"]);
    }

    #[tokio::test]
    async fn verify_notification_parses_plaintext_body() {
        let mock = MockPaymentProvider::new();
        let body = br#"{"out_trade_no":"OC9","trade_state":"SUCCESS","payer":{"openid":"U9"}}"#;

        let notification = mock
            .verify_notification(&NotificationHeaders::default(), body)
            .await
            .unwrap();

        assert_eq!(notification.order_code.as_str(), "OC9");
        assert!(notification.is_paid());
        assert_eq!(notification.payer_open_id.unwrap().as_str(), "U9");
    }

    #[tokio::test]
    async fn verify_notification_returns_configured() {
        let mock = MockPaymentProvider::new();
        mock.set_notification(MockPaymentProvider::notification(
            &OrderCode::parse("OC2").unwrap(),
            "U2",
            TradeState::NotPay,
        ));

        let notification = mock
            .verify_notification(&NotificationHeaders::default(), b"ignored")
            .await
            .unwrap();
        assert_eq!(notification.trade_state, TradeState::NotPay);
    }

    #[tokio::test]
    async fn rejecting_notifications_fails_verification() {
        let mock = MockPaymentProvider::rejecting_notifications();
        mock.set_notification(MockPaymentProvider::success_notification(
            &OrderCode::parse("OC1").unwrap(),
            "U1",
        ));

        let err = mock
            .verify_notification(&NotificationHeaders::default(), b"{}")
            .await
            .unwrap_err();
        assert_eq!(err.code, PaymentErrorCode::InvalidNotification);
    }
}
