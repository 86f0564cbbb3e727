//! Payment domain - orders, order codes, sessions and notifications.

mod errors;
mod notification;
mod order;
mod order_code;
mod session;

pub use errors::PaymentOrderError;
pub use notification::{PaymentNotification, TradeState};
pub use order::{OrderStatus, OrderType};
pub use order_code::{OrderCode, ORDER_CODE_ENTROPY_BYTES};
pub use session::PaymentSession;
