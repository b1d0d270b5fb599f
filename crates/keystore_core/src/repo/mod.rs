//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define the user, token and OAuth config data-access contracts.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Point lookups report absence as `None`, never as an error.
//! - Multi-record writes run in one transaction and fail as a whole.
//! - Backend errors are propagated unchanged; nothing is retried.

pub mod error;
pub mod oauth_repo;
mod schema;
pub mod token_repo;
pub mod user_repo;

pub use error::{RepoError, RepoResult};
