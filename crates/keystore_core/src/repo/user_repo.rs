//! User repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Upsert users synced from the directory, one at a time or as a batch.
//! - Delete users together with every token nested under them.
//!
//! # Invariants
//! - Users are addressed by `hashed_id(email)` only; no email index exists.
//! - `delete_user` removes the user row and its tokens in one transaction.
//! - Deleting an unknown user is a no-op.

use crate::model::key::{hashed_id, log_prefix, UserKey};
use crate::model::user::{DirectoryUser, User};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::schema::{
    ensure_connection_ready, parse_hashed_id, run_batch, TOKENS_TABLE, USERS_TABLE,
};
use crate::repo::token_repo::{SqliteTokenRepository, TokenRepository};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row};

const USER_SELECT_SQL: &str = "SELECT id, email, name FROM users";

const USER_UPSERT_SQL: &str = "INSERT INTO users (id, email, name)
     VALUES (?1, ?2, ?3)
     ON CONFLICT(id) DO UPDATE SET
        email = excluded.email,
        name = excluded.name;";

/// Repository interface for user records.
pub trait UserRepository {
    /// Upserts one user built from a directory payload.
    fn insert_user(&self, directory_user: &DirectoryUser) -> RepoResult<User>;
    /// Upserts all users in one batch. Returns the number of records written.
    fn insert_users(&self, directory_users: &[DirectoryUser]) -> RepoResult<usize>;
    /// Loads one user by email.
    fn get_user(&self, email: &str) -> RepoResult<Option<User>>;
    /// Loads every user. Unordered and unpaginated.
    fn get_users(&self) -> RepoResult<Vec<User>>;
    /// Counts every user.
    fn get_count(&self) -> RepoResult<u64>;
    /// Deletes one user and all of its tokens.
    fn delete_user(&self, email: &str) -> RepoResult<()>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[USERS_TABLE, TOKENS_TABLE])?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn insert_user(&self, directory_user: &DirectoryUser) -> RepoResult<User> {
        let user = User::from_directory(directory_user);
        self.conn.execute(
            USER_UPSERT_SQL,
            params![user.id.as_str(), user.email.as_str(), user.name.as_str()],
        )?;

        info!(
            "event=user_insert module=repo status=ok user={}",
            log_prefix(&user.id)
        );
        Ok(user)
    }

    fn insert_users(&self, directory_users: &[DirectoryUser]) -> RepoResult<usize> {
        let users: Vec<User> = directory_users.iter().map(User::from_directory).collect();

        run_batch(self.conn, "insert_users", users.len(), |tx| {
            let mut stmt = tx.prepare(USER_UPSERT_SQL)?;
            for user in &users {
                stmt.execute(params![
                    user.id.as_str(),
                    user.email.as_str(),
                    user.name.as_str()
                ])?;
            }
            Ok(())
        })?;

        info!(
            "event=user_insert_batch module=repo status=ok count={}",
            users.len()
        );
        Ok(users.len())
    }

    fn get_user(&self, email: &str) -> RepoResult<Option<User>> {
        load_user(self.conn, &UserKey::for_email(email))
    }

    fn get_users(&self) -> RepoResult<Vec<User>> {
        let mut stmt = self.conn.prepare(USER_SELECT_SQL)?;
        let mut rows = stmt.query([])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }

    fn get_count(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM users;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative user count `{count}`")))
    }

    fn delete_user(&self, email: &str) -> RepoResult<()> {
        let user_key = UserKey::for_email(email);
        let token_keys = SqliteTokenRepository::try_new(self.conn)?.get_token_keys(email)?;

        run_batch(self.conn, "delete_user", token_keys.len() + 1, |tx| {
            tx.execute("DELETE FROM users WHERE id = ?1;", [user_key.user_id.as_str()])?;
            let mut stmt =
                tx.prepare("DELETE FROM tokens WHERE user_id = ?1 AND token_id = ?2;")?;
            for key in &token_keys {
                stmt.execute(params![key.user_id.as_str(), key.token_id.as_str()])?;
            }
            Ok(())
        })?;

        info!(
            "event=user_delete module=repo status=ok user={} tokens_deleted={}",
            log_prefix(&user_key.user_id),
            token_keys.len()
        );
        Ok(())
    }
}

/// Loads the user at `key`, if present.
pub(crate) fn load_user(conn: &Connection, key: &UserKey) -> RepoResult<Option<User>> {
    let mut stmt = conn.prepare(&format!("{USER_SELECT_SQL} WHERE id = ?1;"))?;
    let row = stmt
        .query_row([key.user_id.as_str()], |row| {
            Ok((
                row.get::<_, String>("id")?,
                row.get::<_, String>("email")?,
                row.get::<_, String>("name")?,
            ))
        })
        .optional()?;

    row.map(|(id, email, name)| build_user(id, email, name))
        .transpose()
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    build_user(row.get("id")?, row.get("email")?, row.get("name")?)
}

fn build_user(id: String, email: String, name: String) -> RepoResult<User> {
    let id = parse_hashed_id(id, "users.id")?;
    if id != hashed_id(&email) {
        return Err(RepoError::InvalidData(format!(
            "users.id `{}` does not match its email",
            log_prefix(&id)
        )));
    }
    Ok(User { id, email, name })
}
