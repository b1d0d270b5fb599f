//! OAuth client credential singleton.
//!
//! # Invariants
//! - Exactly one record exists, at [`OAUTH_CONFIG_ID`].
//! - `client_secret` is stored in plain text; it is redacted from `Debug`
//!   output but is not encrypted at rest.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};

/// Fixed id of the singleton record.
pub const OAUTH_CONFIG_ID: &str = "my_client_secret";

/// Placeholder written when the record is first read.
pub const PLACEHOLDER_CLIENT_ID: &str = "Change me to the real id.";

/// Placeholder written when the record is first read.
pub const PLACEHOLDER_CLIENT_SECRET: &str = "Change me to the real secret.";

/// OAuth client credentials used by the request-handling layer.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
}

impl OAuthConfig {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Placeholder credentials used for lazy initialization and resets.
    pub fn placeholder() -> Self {
        Self::new(PLACEHOLDER_CLIENT_ID, PLACEHOLDER_CLIENT_SECRET)
    }

    /// Returns whether the record still holds the placeholder values.
    pub fn is_placeholder(&self) -> bool {
        self.client_id == PLACEHOLDER_CLIENT_ID && self.client_secret == PLACEHOLDER_CLIENT_SECRET
    }
}

impl Debug for OAuthConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::OAuthConfig;

    #[test]
    fn placeholder_is_detected() {
        assert!(OAuthConfig::placeholder().is_placeholder());
        assert!(!OAuthConfig::new("id", "secret").is_placeholder());
    }

    #[test]
    fn debug_output_redacts_secret() {
        let rendered = format!("{:?}", OAuthConfig::new("id-1", "hunter2"));
        assert!(rendered.contains("id-1"));
        assert!(!rendered.contains("hunter2"));
    }
}
