//! Purchase-flow error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | InvalidRequest | 400 |
//! | Provider | 502 |
//! | Internal | 500 |

use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};

/// Errors surfaced to the caller of a purchase request.
///
/// Ledger failures never appear here; the purchase flow logs and continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOrderError {
    /// Caller input rejected before any side effect.
    InvalidRequest { field: String, message: String },

    /// The payment provider refused or could not be reached.
    Provider(String),

    /// Local failure (randomness, signing material).
    Internal(String),
}

impl PaymentOrderError {
    pub fn invalid_request(field: impl Into<String>, message: impl Into<String>) -> Self {
        PaymentOrderError::InvalidRequest {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn provider(message: impl Into<String>) -> Self {
        PaymentOrderError::Provider(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        PaymentOrderError::Internal(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            PaymentOrderError::InvalidRequest { .. } => ErrorCode::ValidationFailed,
            PaymentOrderError::Provider(_) => ErrorCode::ExternalServiceError,
            PaymentOrderError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Returns a user-facing error message.
    pub fn message(&self) -> String {
        match self {
            PaymentOrderError::InvalidRequest { field, message } => {
                format!("Invalid request field '{}': {}", field, message)
            }
            PaymentOrderError::Provider(msg) => format!("Payment provider error: {}", msg),
            PaymentOrderError::Internal(msg) => format!("Internal error: {}", msg),
        }
    }
}

impl std::fmt::Display for PaymentOrderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for PaymentOrderError {}

impl From<ValidationError> for PaymentOrderError {
    fn from(err: ValidationError) -> Self {
        PaymentOrderError::InvalidRequest {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<PaymentOrderError> for DomainError {
    fn from(err: PaymentOrderError) -> Self {
        let domain = DomainError::new(err.code(), err.message());
        match err {
            PaymentOrderError::InvalidRequest { field, .. } => domain.with_detail("field", field),
            _ => domain,
        }
    }
}
