use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use super::models::User;

pub struct NewUser<'a> {
    pub name: &'a str,
    pub username: &'a str,
    pub password_hash: &'a str,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Registration {
    Created(i64),
    UsernameTaken,
}

/// Insert a user unless the username is already in use. The check and the
/// insert share one immediate transaction.
pub fn register(conn: &mut Connection, user: &NewUser<'_>) -> rusqlite::Result<Registration> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    if find_by_username(&tx, user.username)?.is_some() {
        return Ok(Registration::UsernameTaken);
    }

    tx.execute(
        "INSERT INTO Users (name, username, password) VALUES (?1, ?2, ?3)",
        params![user.name, user.username, user.password_hash],
    )?;
    let id = tx.last_insert_rowid();
    tx.commit()?;

    Ok(Registration::Created(id))
}

/// Case-insensitive lookup.
pub fn find_by_username(conn: &Connection, username: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        "SELECT id, name, username, password FROM Users WHERE LOWER(username) = LOWER(?1)",
        params![username],
        User::from_row,
    )
    .optional()
}
