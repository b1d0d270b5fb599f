use keystore_core::db::migrations::latest_version;
use keystore_core::db::open_db_in_memory;
use keystore_core::{
    hashed_id, DirectoryUser, KeyPair, RepoError, SqliteTokenRepository, SqliteUserRepository,
    TokenRepository, UserRepository,
};
use rusqlite::Connection;
use std::collections::HashSet;

#[test]
fn insert_and_get_user_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    let inserted = repo
        .insert_user(&DirectoryUser::new("a@x.com", "A X"))
        .unwrap();
    assert_eq!(inserted.id, hashed_id("a@x.com"));

    let loaded = repo.get_user("a@x.com").unwrap().unwrap();
    assert_eq!(loaded.email, "a@x.com");
    assert_eq!(loaded.name, "A X");
    assert!(repo.get_user("b@x.com").unwrap().is_none());
}

#[test]
fn insert_user_overwrites_on_same_email() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    repo.insert_user(&DirectoryUser::new("a@x.com", "Old Name"))
        .unwrap();
    repo.insert_user(&DirectoryUser::new("a@x.com", "New Name"))
        .unwrap();

    assert_eq!(repo.get_count().unwrap(), 1);
    assert_eq!(repo.get_user("a@x.com").unwrap().unwrap().name, "New Name");
}

#[test]
fn insert_users_writes_whole_batch() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    let written = repo
        .insert_users(&[
            DirectoryUser::new("a@x.com", "A"),
            DirectoryUser::new("b@x.com", "B"),
            DirectoryUser::new("c@x.com", "C"),
        ])
        .unwrap();
    assert_eq!(written, 3);
    assert_eq!(repo.get_count().unwrap(), 3);

    let emails: HashSet<String> = repo
        .get_users()
        .unwrap()
        .into_iter()
        .map(|user| user.email)
        .collect();
    assert_eq!(
        emails,
        HashSet::from(["a@x.com".to_string(), "b@x.com".to_string(), "c@x.com".to_string()])
    );
}

#[test]
fn insert_users_accepts_empty_batch() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    assert_eq!(repo.insert_users(&[]).unwrap(), 0);
    assert_eq!(repo.get_count().unwrap(), 0);
    assert!(repo.get_users().unwrap().is_empty());
}

#[test]
fn failed_batch_is_one_error_and_writes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    conn.execute_batch(
        "CREATE TRIGGER reject_blocked BEFORE INSERT ON users
         WHEN NEW.email = 'blocked@x.com'
         BEGIN SELECT RAISE(ABORT, 'blocked'); END;",
    )
    .unwrap();

    let err = repo
        .insert_users(&[
            DirectoryUser::new("a@x.com", "A"),
            DirectoryUser::new("blocked@x.com", "B"),
            DirectoryUser::new("c@x.com", "C"),
        ])
        .unwrap_err();

    assert!(matches!(
        err,
        RepoError::Batch {
            operation: "insert_users",
            size: 3,
            ..
        }
    ));
    assert_eq!(repo.get_count().unwrap(), 0);
}

#[test]
fn delete_user_is_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    repo.insert_user(&DirectoryUser::new("a@x.com", "A X"))
        .unwrap();

    repo.delete_user("a@x.com").unwrap();
    repo.delete_user("a@x.com").unwrap();
    repo.delete_user("never-existed@x.com").unwrap();

    assert!(repo.get_user("a@x.com").unwrap().is_none());
}

#[test]
fn delete_user_cascades_to_owned_tokens_only() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let tokens = SqliteTokenRepository::try_new(&conn).unwrap();

    users
        .insert_users(&[
            DirectoryUser::new("a@x.com", "A"),
            DirectoryUser::new("b@x.com", "B"),
        ])
        .unwrap();
    for index in 0..4 {
        tokens
            .insert_token(
                "a@x.com",
                &KeyPair::new(format!("pk-a-{index}"), format!("sk-a-{index}")),
            )
            .unwrap();
    }
    tokens
        .insert_token("b@x.com", &KeyPair::new("pk-b", "sk-b"))
        .unwrap();

    users.delete_user("a@x.com").unwrap();

    assert!(users.get_user("a@x.com").unwrap().is_none());
    assert!(tokens.get_tokens("a@x.com").unwrap().is_empty());
    assert!(tokens.get_token_keys("a@x.com").unwrap().is_empty());
    assert_eq!(tokens.get_tokens("b@x.com").unwrap().len(), 1);
    assert!(users.get_user("b@x.com").unwrap().is_some());
}

#[test]
fn delete_user_removes_orphaned_tokens_under_its_key() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let tokens = SqliteTokenRepository::try_new(&conn).unwrap();

    tokens
        .insert_token("ghost@x.com", &KeyPair::new("pk", "sk"))
        .unwrap();
    users.delete_user("ghost@x.com").unwrap();

    assert!(tokens.get_tokens("ghost@x.com").unwrap().is_empty());
}

#[test]
fn reading_corrupted_user_id_returns_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    conn.execute(
        "INSERT INTO users (id, email, name) VALUES ('not-a-hash', 'a@x.com', 'A');",
        [],
    )
    .unwrap();

    let err = repo.get_users().unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("users.id")));
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteUserRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_tokens_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE users (
            id TEXT PRIMARY KEY NOT NULL,
            email TEXT NOT NULL,
            name TEXT NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqliteUserRepository::try_new(&conn),
        Err(RepoError::MissingRequiredTable("tokens"))
    ));
}

#[test]
fn repository_rejects_users_table_missing_name_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE users (id TEXT PRIMARY KEY NOT NULL, email TEXT NOT NULL);",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqliteUserRepository::try_new(&conn),
        Err(RepoError::MissingRequiredColumn {
            table: "users",
            column: "name"
        })
    ));
}
