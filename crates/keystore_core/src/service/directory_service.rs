//! Directory sync and key issuance use-cases.
//!
//! # Responsibility
//! - Sync directory users into the keystore.
//! - Issue, list and revoke per-user key pairs.
//! - Offboard users, removing every key pair they own.
//!
//! # Invariants
//! - Service APIs never bypass repository contracts.
//! - Issuing a key pair does not require the user to be synced first.

use crate::model::key::TokenKey;
use crate::model::token::{KeyPair, Token};
use crate::model::user::{DirectoryUser, User};
use crate::repo::token_repo::TokenRepository;
use crate::repo::user_repo::UserRepository;
use crate::repo::RepoResult;

/// A user together with every key pair it owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserKeys {
    pub user: User,
    pub tokens: Vec<Token>,
}

/// Use-case service over user and token repositories.
pub struct DirectoryService<U: UserRepository, T: TokenRepository> {
    users: U,
    tokens: T,
}

impl<U: UserRepository, T: TokenRepository> DirectoryService<U, T> {
    pub fn new(users: U, tokens: T) -> Self {
        Self { users, tokens }
    }

    /// Upserts one directory user.
    pub fn sync_user(&self, directory_user: &DirectoryUser) -> RepoResult<User> {
        self.users.insert_user(directory_user)
    }

    /// Upserts a full directory page in one batch.
    pub fn sync_users(&self, directory_users: &[DirectoryUser]) -> RepoResult<usize> {
        self.users.insert_users(directory_users)
    }

    pub fn user(&self, email: &str) -> RepoResult<Option<User>> {
        self.users.get_user(email)
    }

    pub fn users(&self) -> RepoResult<Vec<User>> {
        self.users.get_users()
    }

    pub fn user_count(&self) -> RepoResult<u64> {
        self.users.get_count()
    }

    /// Loads a user and all of its key pairs.
    ///
    /// Returns `None` when the user is unknown, even if orphaned tokens exist
    /// under its key.
    pub fn user_keys(&self, email: &str) -> RepoResult<Option<UserKeys>> {
        let Some(user) = self.users.get_user(email)? else {
            return Ok(None);
        };
        let tokens = self.tokens.get_tokens(email)?;
        Ok(Some(UserKeys { user, tokens }))
    }

    pub fn issue_key_pair(&self, email: &str, key_pair: &KeyPair) -> RepoResult<TokenKey> {
        self.tokens.insert_token(email, key_pair)
    }

    pub fn key_pairs(&self, email: &str) -> RepoResult<Vec<Token>> {
        self.tokens.get_tokens(email)
    }

    pub fn key_pair(
        &self,
        email: &str,
        public_key: &str,
    ) -> RepoResult<(Option<User>, Option<Token>)> {
        self.tokens.get_token(email, public_key)
    }

    pub fn revoke_key_pair(&self, email: &str, public_key: &str) -> RepoResult<()> {
        self.tokens.delete_token(email, public_key)
    }

    /// Removes a user and every key pair nested under it.
    pub fn offboard_user(&self, email: &str) -> RepoResult<()> {
        self.users.delete_user(email)
    }
}
