//! Token repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Store per-user key pairs under the owning user's key.
//! - Answer ancestor-scoped queries ("all tokens of this user").
//!
//! # Invariants
//! - Tokens are addressed by `(hashed_id(email), hashed_id(public_key))`.
//! - The owning user is never checked on insert; orphaned tokens are legal.
//! - Ancestor queries never return tokens of another user.

use crate::model::key::{log_prefix, TokenKey, UserKey};
use crate::model::token::{KeyPair, Token};
use crate::model::user::User;
use crate::repo::error::RepoResult;
use crate::repo::schema::{ensure_connection_ready, parse_hashed_id, TOKENS_TABLE, USERS_TABLE};
use crate::repo::user_repo::load_user;
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension, Row};

const TOKEN_SELECT_SQL: &str = "SELECT user_id, token_id, public_key, private_key FROM tokens";

/// Repository interface for token records.
pub trait TokenRepository {
    /// Upserts the token for `key_pair` under the user owning `email`.
    fn insert_token(&self, email: &str, key_pair: &KeyPair) -> RepoResult<TokenKey>;
    /// Deletes one token. No-op when absent.
    fn delete_token(&self, email: &str, public_key: &str) -> RepoResult<()>;
    /// Lists only the keys of every token owned by `email`.
    fn get_token_keys(&self, email: &str) -> RepoResult<Vec<TokenKey>>;
    /// Lists every token owned by `email`. Unordered.
    fn get_tokens(&self, email: &str) -> RepoResult<Vec<Token>>;
    /// Loads one token and its owning user. Either side may be absent.
    fn get_token(
        &self,
        email: &str,
        public_key: &str,
    ) -> RepoResult<(Option<User>, Option<Token>)>;
}

/// SQLite-backed token repository.
pub struct SqliteTokenRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTokenRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[USERS_TABLE, TOKENS_TABLE])?;
        Ok(Self { conn })
    }
}

impl TokenRepository for SqliteTokenRepository<'_> {
    fn insert_token(&self, email: &str, key_pair: &KeyPair) -> RepoResult<TokenKey> {
        let token = Token::for_owner(email, key_pair);
        self.conn.execute(
            "INSERT INTO tokens (user_id, token_id, public_key, private_key)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(user_id, token_id) DO UPDATE SET
                public_key = excluded.public_key,
                private_key = excluded.private_key;",
            params![
                token.key.user_id.as_str(),
                token.key.token_id.as_str(),
                token.public_key.as_str(),
                token.private_key.as_str(),
            ],
        )?;

        info!(
            "event=token_insert module=repo status=ok user={} token={}",
            log_prefix(&token.key.user_id),
            log_prefix(&token.key.token_id)
        );
        Ok(token.key)
    }

    fn delete_token(&self, email: &str, public_key: &str) -> RepoResult<()> {
        let key = TokenKey::for_pair(email, public_key);
        let changed = self.conn.execute(
            "DELETE FROM tokens WHERE user_id = ?1 AND token_id = ?2;",
            params![key.user_id.as_str(), key.token_id.as_str()],
        )?;

        info!(
            "event=token_delete module=repo status=ok user={} token={} deleted={}",
            log_prefix(&key.user_id),
            log_prefix(&key.token_id),
            changed
        );
        Ok(())
    }

    fn get_token_keys(&self, email: &str) -> RepoResult<Vec<TokenKey>> {
        let parent = UserKey::for_email(email);
        let mut stmt = self
            .conn
            .prepare("SELECT user_id, token_id FROM tokens WHERE user_id = ?1;")?;
        let mut rows = stmt.query([parent.user_id.as_str()])?;
        let mut keys = Vec::new();
        while let Some(row) = rows.next()? {
            keys.push(parse_token_key(row)?);
        }

        debug!(
            "event=token_keys_query module=repo status=ok user={} count={}",
            log_prefix(&parent.user_id),
            keys.len()
        );
        Ok(keys)
    }

    fn get_tokens(&self, email: &str) -> RepoResult<Vec<Token>> {
        let parent = UserKey::for_email(email);
        let mut stmt = self
            .conn
            .prepare(&format!("{TOKEN_SELECT_SQL} WHERE user_id = ?1;"))?;
        let mut rows = stmt.query([parent.user_id.as_str()])?;
        let mut tokens = Vec::new();
        while let Some(row) = rows.next()? {
            tokens.push(parse_token_row(row)?);
        }
        Ok(tokens)
    }

    fn get_token(
        &self,
        email: &str,
        public_key: &str,
    ) -> RepoResult<(Option<User>, Option<Token>)> {
        let key = TokenKey::for_pair(email, public_key);
        let mut stmt = self
            .conn
            .prepare(&format!("{TOKEN_SELECT_SQL} WHERE user_id = ?1 AND token_id = ?2;"))?;
        let raw = stmt
            .query_row(params![key.user_id.as_str(), key.token_id.as_str()], |row| {
                Ok(RawToken {
                    user_id: row.get("user_id")?,
                    token_id: row.get("token_id")?,
                    public_key: row.get("public_key")?,
                    private_key: row.get("private_key")?,
                })
            })
            .optional()?;

        let token = raw.map(RawToken::into_token).transpose()?;
        let user = load_user(self.conn, &key.parent())?;
        Ok((user, token))
    }
}

struct RawToken {
    user_id: String,
    token_id: String,
    public_key: String,
    private_key: String,
}

impl RawToken {
    fn into_token(self) -> RepoResult<Token> {
        Ok(Token {
            key: TokenKey {
                user_id: parse_hashed_id(self.user_id, "tokens.user_id")?,
                token_id: parse_hashed_id(self.token_id, "tokens.token_id")?,
            },
            public_key: self.public_key,
            private_key: self.private_key,
        })
    }
}

fn parse_token_key(row: &Row<'_>) -> RepoResult<TokenKey> {
    Ok(TokenKey {
        user_id: parse_hashed_id(row.get("user_id")?, "tokens.user_id")?,
        token_id: parse_hashed_id(row.get("token_id")?, "tokens.token_id")?,
    })
}

fn parse_token_row(row: &Row<'_>) -> RepoResult<Token> {
    RawToken {
        user_id: row.get("user_id")?,
        token_id: row.get("token_id")?,
        public_key: row.get("public_key")?,
        private_key: row.get("private_key")?,
    }
    .into_token()
}
