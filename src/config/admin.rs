//! Admin API configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// Admin route configuration
///
/// Admin routes reject every call when no token is configured.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminConfig {
    /// Shared token expected in `X-Admin-Token`
    pub token: Option<SecretString>,
}

impl AdminConfig {
    pub fn is_enabled(&self) -> bool {
        self.token
            .as_ref()
            .map_or(false, |t| !t.expose_secret().is_empty())
    }
}
