//! Deterministic storage keys.
//!
//! # Responsibility
//! - Hash natural keys (email, public key) into fixed-length ids.
//! - Model the user -> token key hierarchy used by ancestor queries.
//!
//! # Invariants
//! - A hashed id is always 64 lowercase hex characters.
//! - `TokenKey::parent()` is the key of the owning user.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::{Display, Formatter};

/// Hex-encoded SHA-256 of a user's email.
pub type UserId = String;

/// Hex-encoded SHA-256 of a token's public key.
pub type TokenId = String;

static HASHED_ID_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new("^[0-9a-f]{64}$").ok());

/// Returns the hex-encoded SHA-256 digest of `value`.
pub fn hashed_id(value: &str) -> String {
    hex::encode(Sha256::digest(value.as_bytes()))
}

/// Returns whether `value` has the shape of a [`hashed_id`] output.
pub fn is_hashed_id(value: &str) -> bool {
    match HASHED_ID_PATTERN.as_ref() {
        Some(pattern) => pattern.is_match(value),
        None => false,
    }
}

/// Short id prefix safe to put in log lines.
pub(crate) fn log_prefix(id: &str) -> &str {
    id.get(..12).unwrap_or(id)
}

/// Root key of one user record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserKey {
    pub user_id: UserId,
}

impl UserKey {
    /// Derives the key for the user owning `email`.
    pub fn for_email(email: &str) -> Self {
        Self {
            user_id: hashed_id(email),
        }
    }
}

impl Display for UserKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "User/{}", self.user_id)
    }
}

/// Composite key of one token record, nested under its owning user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenKey {
    pub user_id: UserId,
    pub token_id: TokenId,
}

impl TokenKey {
    /// Derives the key for `public_key` issued to the user owning `email`.
    pub fn for_pair(email: &str, public_key: &str) -> Self {
        Self {
            user_id: hashed_id(email),
            token_id: hashed_id(public_key),
        }
    }

    /// Key of the user this token is nested under.
    pub fn parent(&self) -> UserKey {
        UserKey {
            user_id: self.user_id.clone(),
        }
    }
}

impl Display for TokenKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "User/{}/Token/{}", self.user_id, self.token_id)
    }
}
