//! Ledger service configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Record-keeping service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Base URL including the platform prefix, e.g. `http://ledger:8080/utility-project`
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl LedgerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate ledger configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.base_url.is_empty() {
            return Err(ValidationError::MissingRequired("ledger.base_url"));
        }
        if !is_http_url(&self.base_url) {
            return Err(ValidationError::InvalidUrl("ledger.base_url"));
        }
        if self.timeout_secs == 0 || self.timeout_secs > 120 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    10
}

pub(super) fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
