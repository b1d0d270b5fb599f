//! Read-through cache in front of the OAuth config repository.
//!
//! # Responsibility
//! - Serve repeated credential reads without touching storage.
//! - Drop the cached copy on `flush()` and on every write made through it.
//!
//! # Invariants
//! - A cached value is only ever a value previously read from storage.
//! - Writes that bypass this wrapper are not seen until `flush()`.

use crate::model::oauth::OAuthConfig;
use crate::repo::oauth_repo::OAuthConfigRepository;
use crate::repo::RepoResult;
use log::debug;
use std::sync::{PoisonError, RwLock};

/// Flushable read-through cache decorating any [`OAuthConfigRepository`].
pub struct CachedOAuthConfigRepository<R: OAuthConfigRepository> {
    inner: R,
    cached: RwLock<Option<OAuthConfig>>,
}

impl<R: OAuthConfigRepository> CachedOAuthConfigRepository<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            cached: RwLock::new(None),
        }
    }

    /// Returns whether a value is currently cached.
    pub fn is_cached(&self) -> bool {
        self.cached
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn invalidate(&self) {
        *self.cached.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl<R: OAuthConfigRepository> OAuthConfigRepository for CachedOAuthConfigRepository<R> {
    fn get_entity(&self) -> RepoResult<OAuthConfig> {
        {
            let cached = self.cached.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(config) = cached.as_ref() {
                return Ok(config.clone());
            }
        }

        let config = self.inner.get_entity()?;
        *self.cached.write().unwrap_or_else(PoisonError::into_inner) = Some(config.clone());
        debug!("event=oauth_cache_fill module=cache status=ok");
        Ok(config)
    }

    fn set_entity(&self, client_id: &str, client_secret: &str) -> RepoResult<()> {
        let result = self.inner.set_entity(client_id, client_secret);
        self.invalidate();
        result
    }

    fn set_default_entity(&self) -> RepoResult<()> {
        let result = self.inner.set_default_entity();
        self.invalidate();
        result
    }

    fn flush(&self) -> RepoResult<()> {
        self.invalidate();
        debug!("event=oauth_cache_flush module=cache status=ok");
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::CachedOAuthConfigRepository;
    use crate::model::oauth::OAuthConfig;
    use crate::repo::oauth_repo::OAuthConfigRepository;
    use crate::repo::RepoResult;
    use std::cell::{Cell, RefCell};

    struct CountingRepository {
        stored: RefCell<OAuthConfig>,
        reads: Cell<u32>,
    }

    impl CountingRepository {
        fn new() -> Self {
            Self {
                stored: RefCell::new(OAuthConfig::placeholder()),
                reads: Cell::new(0),
            }
        }
    }

    impl OAuthConfigRepository for &CountingRepository {
        fn get_entity(&self) -> RepoResult<OAuthConfig> {
            self.reads.set(self.reads.get() + 1);
            Ok(self.stored.borrow().clone())
        }

        fn set_entity(&self, client_id: &str, client_secret: &str) -> RepoResult<()> {
            *self.stored.borrow_mut() = OAuthConfig::new(client_id, client_secret);
            Ok(())
        }

        fn set_default_entity(&self) -> RepoResult<()> {
            *self.stored.borrow_mut() = OAuthConfig::placeholder();
            Ok(())
        }
    }

    #[test]
    fn repeated_reads_hit_storage_once() {
        let backing = CountingRepository::new();
        let cached = CachedOAuthConfigRepository::new(&backing);

        assert!(cached.get_entity().unwrap().is_placeholder());
        assert_eq!(cached.get_client_id().unwrap(), "Change me to the real id.");
        assert_eq!(backing.reads.get(), 1);
        assert!(cached.is_cached());
    }

    #[test]
    fn flush_forces_reread_of_external_write() {
        let backing = CountingRepository::new();
        let cached = CachedOAuthConfigRepository::new(&backing);
        cached.get_entity().unwrap();

        *backing.stored.borrow_mut() = OAuthConfig::new("real-id", "real-secret");
        assert_eq!(cached.get_client_id().unwrap(), "Change me to the real id.");

        cached.flush().unwrap();
        assert!(!cached.is_cached());
        assert_eq!(cached.get_client_id().unwrap(), "real-id");
        assert_eq!(backing.reads.get(), 2);
    }

    #[test]
    fn writes_through_cache_invalidate_it() {
        let backing = CountingRepository::new();
        let cached = CachedOAuthConfigRepository::new(&backing);
        cached.get_entity().unwrap();

        cached.set_entity("id-2", "secret-2").unwrap();
        assert_eq!(cached.get_secret().unwrap(), "secret-2");

        cached.set_default_entity().unwrap();
        assert!(cached.get_entity().unwrap().is_placeholder());
    }
}
