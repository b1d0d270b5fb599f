//! Connection readiness checks and shared SQL helpers.
//!
//! # Invariants
//! - Repositories are only constructed over connections at the latest schema
//!   version with every required table and column present.
//! - `run_batch` commits all statements or none.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::key::is_hashed_id;
use crate::repo::error::{RepoError, RepoResult};
use log::error;
use rusqlite::{Connection, Transaction, TransactionBehavior};

pub(crate) const USERS_TABLE: (&str, &[&str]) = ("users", &["id", "email", "name"]);

pub(crate) const TOKENS_TABLE: (&str, &[&str]) = (
    "tokens",
    &["user_id", "token_id", "public_key", "private_key"],
);

pub(crate) const OAUTH_CONFIG_TABLE: (&str, &[&str]) =
    ("oauth_config", &["id", "client_id", "client_secret"]);

pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    tables: &[(&'static str, &'static [&'static str])],
) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &(table, columns) in tables {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

/// Runs `body` inside one immediate transaction.
///
/// Any failure, including `BEGIN` and `COMMIT`, rolls the batch back and is
/// reported as a single [`RepoError::Batch`].
pub(crate) fn run_batch<T>(
    conn: &Connection,
    operation: &'static str,
    size: usize,
    body: impl FnOnce(&Transaction<'_>) -> rusqlite::Result<T>,
) -> RepoResult<T> {
    let outcome = Transaction::new_unchecked(conn, TransactionBehavior::Immediate).and_then(|tx| {
        let value = body(&tx)?;
        tx.commit()?;
        Ok(value)
    });

    outcome.map_err(|err| {
        error!(
            "event=batch_write module=repo status=error operation={} size={} error={}",
            operation, size, err
        );
        RepoError::Batch {
            operation,
            size,
            source: DbError::Sqlite(err),
        }
    })
}

pub(crate) fn parse_hashed_id(value: String, column: &'static str) -> RepoResult<String> {
    if is_hashed_id(&value) {
        Ok(value)
    } else {
        Err(RepoError::InvalidData(format!(
            "invalid hashed id `{value}` in {column}"
        )))
    }
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
