//! EntitlementEvaluator - decides whether a purchase may skip payment.
//!
//! Only eligible order types consult the entitlement store. A missing record,
//! a store failure, or any unmet condition resolves to `Pay`.

use std::sync::Arc;

use crate::domain::entitlement::{EntitlementDecision, EntitlementPolicy};
use crate::domain::foundation::{OpenId, Timestamp};
use crate::domain::payment::OrderType;
use crate::ports::EntitlementReader;

/// Evaluates entitlement bypass for a customer and order type.
pub struct EntitlementEvaluator {
    reader: Arc<dyn EntitlementReader>,
    policy: EntitlementPolicy,
}

impl EntitlementEvaluator {
    pub fn new(reader: Arc<dyn EntitlementReader>, policy: EntitlementPolicy) -> Self {
        Self { reader, policy }
    }

    pub fn policy(&self) -> &EntitlementPolicy {
        &self.policy
    }

    /// Evaluates against the current time.
    pub async fn evaluate(&self, open_id: &OpenId, order_type: OrderType) -> EntitlementDecision {
        self.evaluate_at(open_id, order_type, Timestamp::now()).await
    }

    /// Evaluates against an explicit clock reading.
    pub async fn evaluate_at(
        &self,
        open_id: &OpenId,
        order_type: OrderType,
        now: Timestamp,
    ) -> EntitlementDecision {
        if !self.policy.is_eligible(order_type) {
            return EntitlementDecision::Pay;
        }

        let entitlement = match self.reader.lookup(open_id).await {
            Ok(Some(entitlement)) => entitlement,
            Ok(None) => {
                tracing::debug!(%open_id, %order_type, "No entitlement record");
                return EntitlementDecision::Pay;
            }
            Err(e) => {
                tracing::warn!(
                    %open_id,
                    %order_type,
                    error = %e,
                    "Entitlement lookup failed, collecting payment"
                );
                return EntitlementDecision::Pay;
            }
        };

        if entitlement.permits_bypass(&now) {
            tracing::info!(%open_id, %order_type, "Entitlement bypass granted");
            EntitlementDecision::Bypass
        } else {
            tracing::debug!(
                %open_id,
                %order_type,
                status = ?entitlement.status,
                "Entitlement present but not in force"
            );
            EntitlementDecision::Pay
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entitlement::{Entitlement, EntitlementStatus};
    use crate::domain::foundation::DomainError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    // ════════════════════════════════════════════════════════════════════════════
    // Mock Implementations
    // ════════════════════════════════════════════════════════════════════════════

    struct MockEntitlementReader {
        record: Option<Entitlement>,
        fail: bool,
        lookups: Mutex<Vec<OpenId>>,
    }

    impl MockEntitlementReader {
        fn with(record: Entitlement) -> Self {
            Self {
                record: Some(record),
                fail: false,
                lookups: Mutex::new(Vec::new()),
            }
        }

        fn empty() -> Self {
            Self {
                record: None,
                fail: false,
                lookups: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                record: None,
                fail: true,
                lookups: Mutex::new(Vec::new()),
            }
        }

        fn lookup_count(&self) -> usize {
            self.lookups.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl EntitlementReader for MockEntitlementReader {
        async fn lookup(&self, open_id: &OpenId) -> Result<Option<Entitlement>, DomainError> {
            self.lookups.lock().unwrap().push(open_id.clone());
            if self.fail {
                return Err(DomainError::database("connection refused"));
            }
            Ok(self.record.clone())
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Test Helpers
    // ════════════════════════════════════════════════════════════════════════════

    const T0: i64 = 1_700_000_000;

    fn ts(secs: i64) -> Timestamp {
        Timestamp::from_unix_secs(secs).unwrap()
    }

    fn open_id() -> OpenId {
        OpenId::new("U1").unwrap()
    }

    fn active_record() -> Entitlement {
        Entitlement::grant(open_id(), ts(T0), ts(T0 + 3600), Some("ops".to_string())).unwrap()
    }

    fn evaluator(reader: Arc<MockEntitlementReader>) -> EntitlementEvaluator {
        EntitlementEvaluator::new(reader, EntitlementPolicy::default())
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn active_record_inside_window_bypasses() {
        let reader = Arc::new(MockEntitlementReader::with(active_record()));
        let decision = evaluator(reader)
            .evaluate_at(&open_id(), OrderType::ENTITLEMENT_TIER, ts(T0 + 100))
            .await;

        assert_eq!(decision, EntitlementDecision::Bypass);
    }

    #[tokio::test]
    async fn ineligible_order_type_skips_lookup() {
        let reader = Arc::new(MockEntitlementReader::with(active_record()));
        let decision = evaluator(reader.clone())
            .evaluate_at(&open_id(), OrderType::new(1), ts(T0 + 100))
            .await;

        assert_eq!(decision, EntitlementDecision::Pay);
        assert_eq!(reader.lookup_count(), 0);
    }

    #[tokio::test]
    async fn missing_record_pays() {
        let reader = Arc::new(MockEntitlementReader::empty());
        let decision = evaluator(reader.clone())
            .evaluate_at(&open_id(), OrderType::ENTITLEMENT_TIER, ts(T0 + 100))
            .await;

        assert_eq!(decision, EntitlementDecision::Pay);
        assert_eq!(reader.lookup_count(), 1);
    }

    #[tokio::test]
    async fn store_failure_fails_closed() {
        let reader = Arc::new(MockEntitlementReader::failing());
        let decision = evaluator(reader)
            .evaluate_at(&open_id(), OrderType::ENTITLEMENT_TIER, ts(T0 + 100))
            .await;

        assert_eq!(decision, EntitlementDecision::Pay);
    }

    #[tokio::test]
    async fn inactive_record_pays() {
        let mut record = active_record();
        record.status = Some(EntitlementStatus::Inactive);
        let reader = Arc::new(MockEntitlementReader::with(record));

        let decision = evaluator(reader)
            .evaluate_at(&open_id(), OrderType::ENTITLEMENT_TIER, ts(T0 + 100))
            .await;

        assert_eq!(decision, EntitlementDecision::Pay);
    }

    #[tokio::test]
    async fn window_bounds_are_exclusive() {
        let reader = Arc::new(MockEntitlementReader::with(active_record()));
        let evaluator = evaluator(reader);

        for now in [T0, T0 + 3600, T0 - 1, T0 + 3601] {
            let decision = evaluator
                .evaluate_at(&open_id(), OrderType::ENTITLEMENT_TIER, ts(now))
                .await;
            assert_eq!(decision, EntitlementDecision::Pay, "now = {}", now);
        }
    }

    #[tokio::test]
    async fn custom_policy_widens_eligibility() {
        let reader = Arc::new(MockEntitlementReader::with(active_record()));
        let evaluator = EntitlementEvaluator::new(
            reader,
            EntitlementPolicy::new([OrderType::new(2), OrderType::new(3)]),
        );

        let decision = evaluator
            .evaluate_at(&open_id(), OrderType::new(2), ts(T0 + 100))
            .await;

        assert_eq!(decision, EntitlementDecision::Bypass);
    }
}
