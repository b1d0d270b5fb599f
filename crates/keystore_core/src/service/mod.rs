//! Use-case service layer.
//!
//! # Responsibility
//! - Expose caller-facing entry points on top of repository contracts.
//! - Remain storage-agnostic; every persistence call goes through a trait.

pub mod directory_service;
pub mod oauth_service;
