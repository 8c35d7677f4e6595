//! Persistence for the `users` table.

use crate::error::{CreateUserError, UserStoreError};
use roster_types::{NewUser, User};
use rusqlite::{params, Connection, Row};

/// Lists every user, ordered by name and then by id.
///
/// # Errors
///
/// Returns `UserStoreError::Database` on SQL failure, including a missing
/// `users` table.
pub fn list_users(conn: &Connection) -> Result<Vec<User>, UserStoreError> {
    let mut stmt = conn.prepare("SELECT id, name, email FROM users ORDER BY name ASC, id ASC")?;

    let rows = stmt.query_map([], map_row_to_user)?;
    let mut users = Vec::new();
    for row in rows {
        users.push(row?);
    }
    Ok(users)
}

/// Inserts a user and returns the stored record.
///
/// # Errors
///
/// Returns `CreateUserError::DuplicateEmail` if the email is already taken
/// and `CreateUserError::Database` for any other failure.
pub fn create_user(conn: &Connection, new_user: &NewUser) -> Result<User, CreateUserError> {
    match conn.query_row(
        "INSERT INTO users (name, email) VALUES (?1, ?2) RETURNING id, name, email",
        params![new_user.name, new_user.email],
        map_row_to_user,
    ) {
        Ok(user) => Ok(user),
        Err(rusqlite::Error::SqliteFailure(err, msg))
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            tracing::debug!(detail = msg.as_deref().unwrap_or(""), "unique constraint violated");
            Err(CreateUserError::DuplicateEmail(new_user.email.clone()))
        }
        Err(e) => Err(CreateUserError::Database(e)),
    }
}

fn map_row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
    })
}
