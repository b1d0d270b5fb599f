//! User record and directory payload mapping.
//!
//! # Responsibility
//! - Define the persisted user record.
//! - Map directory API user payloads onto user records.
//!
//! # Invariants
//! - `User::id` is always `hashed_id(email)`.
//! - At most one user exists per distinct email.

use crate::model::key::{hashed_id, UserId, UserKey};
use serde::{Deserialize, Serialize};

/// Name block of a directory user payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryName {
    pub full_name: String,
}

/// User as returned by the directory API.
///
/// Only the fields the keystore persists are modeled; unknown fields are
/// ignored on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryUser {
    pub primary_email: String,
    pub name: DirectoryName,
}

impl DirectoryUser {
    pub fn new(primary_email: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            primary_email: primary_email.into(),
            name: DirectoryName {
                full_name: full_name.into(),
            },
        }
    }
}

/// Persisted application user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Hex SHA-256 of `email`.
    pub id: UserId,
    pub email: String,
    pub name: String,
}

impl User {
    /// Builds the user record for a directory payload. Pure, nothing is stored.
    pub fn from_directory(directory_user: &DirectoryUser) -> Self {
        Self {
            id: hashed_id(&directory_user.primary_email),
            email: directory_user.primary_email.clone(),
            name: directory_user.name.full_name.clone(),
        }
    }

    pub fn key(&self) -> UserKey {
        UserKey {
            user_id: self.id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DirectoryUser, User};
    use crate::model::key::{hashed_id, UserKey};

    #[test]
    fn from_directory_maps_fields_and_derives_id() {
        let user = User::from_directory(&DirectoryUser::new("a@x.com", "A X"));
        assert_eq!(user.id, hashed_id("a@x.com"));
        assert_eq!(user.email, "a@x.com");
        assert_eq!(user.name, "A X");
        assert_eq!(user.key(), UserKey::for_email("a@x.com"));
    }
}
