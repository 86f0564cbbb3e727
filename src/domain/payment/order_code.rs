//! Merchant order code ("out-trade-no").
//!
//! Codes come from the OS CSPRNG. The provider also treats the code as the
//! idempotency key of a prepay request.

use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

/// Number of random bytes behind every generated code (128 bits).
pub const ORDER_CODE_ENTROPY_BYTES: usize = 16;

/// Unique identifier correlating a purchase attempt across this service,
/// the ledger and the payment provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderCode(String);

impl OrderCode {
    /// Generates a fresh code from the operating system's random source.
    pub fn generate() -> Result<Self, rand::Error> {
        Self::generate_with(&mut OsRng)
    }

    /// Generates a code from the given random source.
    ///
    /// The result is 32 uppercase hex characters.
    pub fn generate_with<R: RngCore + ?Sized>(rng: &mut R) -> Result<Self, rand::Error> {
        let mut buf = [0u8; ORDER_CODE_ENTROPY_BYTES];
        rng.try_fill_bytes(&mut buf)?;
        Ok(Self(hex::encode_upper(buf)))
    }

    /// Wraps a code received from outside (provider notification, admin call).
    pub fn parse(code: impl Into<String>) -> Result<Self, ValidationError> {
        let code = code.into();
        if code.trim().is_empty() {
            return Err(ValidationError::empty_field("order_code"));
        }
        Ok(Self(code))
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
