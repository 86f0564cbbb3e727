//! In-memory ledger for tests and local development.
//!
//! Applies the order status state machine, so an illegal edit surfaces as
//! `LedgerError::Rejected` and repeated mark-paid calls are no-ops.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::foundation::{OpenId, StateMachine};
use crate::domain::payment::{OrderCode, OrderStatus, OrderType};
use crate::ports::{LedgerError, OrderLedger};

/// Order as recorded by the in-memory ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerOrder {
    pub open_id: OpenId,
    pub order_type: OrderType,
    pub status: OrderStatus,
}

/// One recorded ledger call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerCall {
    SaveCustomer(OpenId),
    SaveOrder(OrderCode),
    MarkOrderPaid(OrderCode),
}

#[derive(Default)]
struct LedgerState {
    customers: HashSet<OpenId>,
    orders: HashMap<OrderCode, LedgerOrder>,
    calls: Vec<LedgerCall>,
    unavailable: bool,
}

/// In-memory `OrderLedger`.
///
/// # Example
///
/// ```ignore
/// let ledger = Arc::new(InMemoryLedger::new());
/// handler.handle(cmd).await?;
/// assert_eq!(ledger.order_status(&code), Some(OrderStatus::Paid));
/// ```
#[derive(Default)]
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a transport error (or recover).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state().unavailable = unavailable;
    }

    // === Test Helpers ===

    pub fn has_customer(&self, open_id: &OpenId) -> bool {
        self.state().customers.contains(open_id)
    }

    pub fn order(&self, order_code: &OrderCode) -> Option<LedgerOrder> {
        self.state().orders.get(order_code).cloned()
    }

    pub fn order_status(&self, order_code: &OrderCode) -> Option<OrderStatus> {
        self.order(order_code).map(|o| o.status)
    }

    pub fn orders(&self) -> Vec<(OrderCode, LedgerOrder)> {
        self.state()
            .orders
            .iter()
            .map(|(code, order)| (code.clone(), order.clone()))
            .collect()
    }

    pub fn calls(&self) -> Vec<LedgerCall> {
        self.state().calls.clone()
    }

    /// Number of mark-paid edits attempted for `order_code`.
    pub fn mark_paid_count(&self, order_code: &OrderCode) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| matches!(c, LedgerCall::MarkOrderPaid(code) if code == order_code))
            .count()
    }

    fn state(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(state: &mut LedgerState, call: LedgerCall) -> Result<(), LedgerError> {
        state.calls.push(call);
        if state.unavailable {
            return Err(LedgerError::Transport("ledger unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderLedger for InMemoryLedger {
    async fn save_customer(&self, open_id: &OpenId) -> Result<(), LedgerError> {
        let mut state = self.state();
        Self::record(&mut state, LedgerCall::SaveCustomer(open_id.clone()))?;
        state.customers.insert(open_id.clone());
        Ok(())
    }

    async fn save_order(
        &self,
        order_code: &OrderCode,
        order_type: OrderType,
        open_id: &OpenId,
    ) -> Result<(), LedgerError> {
        let mut state = self.state();
        Self::record(&mut state, LedgerCall::SaveOrder(order_code.clone()))?;
        if state.orders.contains_key(order_code) {
            return Err(LedgerError::Rejected(format!(
                "order {} already exists",
                order_code
            )));
        }
        state.orders.insert(
            order_code.clone(),
            LedgerOrder {
                open_id: open_id.clone(),
                order_type,
                status: OrderStatus::Created,
            },
        );
        Ok(())
    }

    async fn mark_order_paid(&self, order_code: &OrderCode) -> Result<(), LedgerError> {
        let mut state = self.state();
        Self::record(&mut state, LedgerCall::MarkOrderPaid(order_code.clone()))?;
        let order = state
            .orders
            .get_mut(order_code)
            .ok_or_else(|| LedgerError::Rejected(format!("unknown order {}", order_code)))?;
        order.status = order
            .status
            .transition_to(OrderStatus::Paid)
            .map_err(|e| LedgerError::Rejected(e.to_string()))?;
        Ok(())
    }
}
