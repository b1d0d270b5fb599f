//! Persistence layer for directory users, their access-token key pairs and
//! the OAuth client credentials of the keystore service.

pub mod cache;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use cache::CachedOAuthConfigRepository;
pub use config::{ConfigError, KeystoreConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::key::{hashed_id, TokenId, TokenKey, UserId, UserKey};
pub use model::oauth::{OAuthConfig, OAUTH_CONFIG_ID};
pub use model::token::{KeyPair, Token};
pub use model::user::{DirectoryName, DirectoryUser, User};
pub use repo::oauth_repo::{OAuthConfigRepository, SqliteOAuthConfigRepository};
pub use repo::token_repo::{SqliteTokenRepository, TokenRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use service::directory_service::{DirectoryService, UserKeys};
pub use service::oauth_service::OAuthConfigService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
