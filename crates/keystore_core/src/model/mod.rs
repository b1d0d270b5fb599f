//! Record types persisted by the keystore.
//!
//! # Responsibility
//! - Define the user, token and OAuth client records shared by repositories.
//! - Derive deterministic storage identities from natural keys.
//!
//! # Invariants
//! - Identities are SHA-256 hex digests, never re-derived from stored ids.
//! - Tokens are always addressed through their owning user's id.

pub mod key;
pub mod oauth;
pub mod token;
pub mod user;
