//! OAuth client credential use-cases.

use crate::model::oauth::OAuthConfig;
use crate::repo::oauth_repo::OAuthConfigRepository;
use crate::repo::RepoResult;

/// Credential accessors for the request-handling layer.
pub struct OAuthConfigService<R: OAuthConfigRepository> {
    repo: R,
}

impl<R: OAuthConfigRepository> OAuthConfigService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Current credentials. Placeholders are written on first access.
    pub fn credentials(&self) -> RepoResult<OAuthConfig> {
        self.repo.get_entity()
    }

    pub fn client_id(&self) -> RepoResult<String> {
        self.repo.get_client_id()
    }

    pub fn client_secret(&self) -> RepoResult<String> {
        self.repo.get_secret()
    }

    /// Returns `false` while the placeholder credentials are still in place.
    pub fn is_configured(&self) -> RepoResult<bool> {
        Ok(!self.repo.get_entity()?.is_placeholder())
    }

    /// Replaces the credentials and flushes any cache in front of storage.
    pub fn configure(&self, client_id: &str, client_secret: &str) -> RepoResult<()> {
        self.repo.set_entity(client_id, client_secret)?;
        self.repo.flush()
    }

    /// Restores placeholder credentials and flushes any cache.
    pub fn reset(&self) -> RepoResult<()> {
        self.repo.set_default_entity()?;
        self.repo.flush()
    }

    pub fn flush(&self) -> RepoResult<()> {
        self.repo.flush()
    }
}
