//! OAuth client credential repository.
//!
//! # Responsibility
//! - Read and overwrite the singleton OAuth config record.
//! - Lazily create the record with placeholder values on first read.
//!
//! # Invariants
//! - Only the row at `OAUTH_CONFIG_ID` is ever read or written.
//! - Lazy initialization is a conditional put, so concurrent first reads
//!   never create a second record or overwrite a value set in between.
//! - There is no delete; once present the record stays present.
//!
//! `client_secret` is stored in plain text. Anyone with read access to the
//! database file can read it.

use crate::model::oauth::{OAuthConfig, OAUTH_CONFIG_ID};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::schema::{ensure_connection_ready, OAUTH_CONFIG_TABLE};
use log::info;
use rusqlite::{params, Connection, OptionalExtension};

/// Repository interface for the OAuth config singleton.
pub trait OAuthConfigRepository {
    /// Loads the record, initializing it with placeholders when absent.
    fn get_entity(&self) -> RepoResult<OAuthConfig>;
    /// Overwrites the record with the supplied credentials.
    fn set_entity(&self, client_id: &str, client_secret: &str) -> RepoResult<()>;
    /// Overwrites the record with placeholder credentials.
    fn set_default_entity(&self) -> RepoResult<()>;

    /// Drops any cached copy so the next read hits storage.
    fn flush(&self) -> RepoResult<()> {
        Ok(())
    }

    fn get_secret(&self) -> RepoResult<String> {
        Ok(self.get_entity()?.client_secret)
    }

    fn get_client_id(&self) -> RepoResult<String> {
        Ok(self.get_entity()?.client_id)
    }
}

/// SQLite-backed OAuth config repository.
pub struct SqliteOAuthConfigRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteOAuthConfigRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[OAUTH_CONFIG_TABLE])?;
        Ok(Self { conn })
    }

    fn load(&self) -> RepoResult<Option<OAuthConfig>> {
        let config = self
            .conn
            .query_row(
                "SELECT client_id, client_secret FROM oauth_config WHERE id = ?1;",
                [OAUTH_CONFIG_ID],
                |row| Ok(OAuthConfig::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;
        Ok(config)
    }

    fn put(&self, config: &OAuthConfig) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO oauth_config (id, client_id, client_secret)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET
                client_id = excluded.client_id,
                client_secret = excluded.client_secret;",
            params![
                OAUTH_CONFIG_ID,
                config.client_id.as_str(),
                config.client_secret.as_str()
            ],
        )?;
        Ok(())
    }
}

impl OAuthConfigRepository for SqliteOAuthConfigRepository<'_> {
    fn get_entity(&self) -> RepoResult<OAuthConfig> {
        if let Some(config) = self.load()? {
            return Ok(config);
        }

        let placeholder = OAuthConfig::placeholder();
        let created = self.conn.execute(
            "INSERT INTO oauth_config (id, client_id, client_secret)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO NOTHING;",
            params![
                OAUTH_CONFIG_ID,
                placeholder.client_id.as_str(),
                placeholder.client_secret.as_str()
            ],
        )?;
        if created > 0 {
            info!("event=oauth_config_default module=repo status=ok reason=absent");
        }

        self.load()?.ok_or_else(|| {
            RepoError::InvalidData("oauth_config row missing after default initialization".into())
        })
    }

    fn set_entity(&self, client_id: &str, client_secret: &str) -> RepoResult<()> {
        self.put(&OAuthConfig::new(client_id, client_secret))?;
        info!("event=oauth_config_set module=repo status=ok");
        Ok(())
    }

    fn set_default_entity(&self) -> RepoResult<()> {
        self.put(&OAuthConfig::placeholder())?;
        info!("event=oauth_config_reset module=repo status=ok");
        Ok(())
    }
}
