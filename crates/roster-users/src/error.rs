//! Error types for user operations.

use thiserror::Error;

/// Errors from read operations on the `users` table.
#[derive(Debug, Error)]
pub enum UserStoreError {
    #[error("user store database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Outcome of a failed user creation.
///
/// A duplicate email is reported separately so the caller can tell it
/// apart from every other failure.
#[derive(Debug, Error)]
pub enum CreateUserError {
    /// Another user already has this email.
    #[error("email already registered: {0}")]
    DuplicateEmail(String),

    /// Any other failure, including other constraint violations.
    #[error("could not create user: {0}")]
    Database(#[from] rusqlite::Error),
}

/// The classifier rejects ages of zero or below.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AgeGroupError {
    #[error("Edad invalida")]
    InvalidAge(i64),
}
