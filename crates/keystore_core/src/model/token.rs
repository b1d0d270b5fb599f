//! Access-token key pair record.
//!
//! # Responsibility
//! - Define the per-user key pair record and its input payload.
//!
//! # Invariants
//! - A token's key is derived from `(owner email, public_key)` only.
//! - `private_key` is stored as given (base64, not encrypted) and must never
//!   appear in `Debug` output or logs.

use crate::model::key::TokenKey;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};

/// Key pair issued to a user, both halves base64 encoded.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPair {
    pub public_key: String,
    pub private_key: String,
}

impl KeyPair {
    pub fn new(public_key: impl Into<String>, private_key: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            private_key: private_key.into(),
        }
    }
}

impl Debug for KeyPair {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Persisted token, nested under its owning user.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub key: TokenKey,
    pub public_key: String,
    pub private_key: String,
}

impl Token {
    /// Builds the token record for `key_pair` issued to `email`.
    pub fn for_owner(email: &str, key_pair: &KeyPair) -> Self {
        Self {
            key: TokenKey::for_pair(email, &key_pair.public_key),
            public_key: key_pair.public_key.clone(),
            private_key: key_pair.private_key.clone(),
        }
    }
}

impl Debug for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("key", &self.key)
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}
