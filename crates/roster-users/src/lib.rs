//! User operations for the roster service.
//!
//! Persistence functions take a plain `rusqlite::Connection` and never open
//! one themselves; the caller owns the connection lifecycle. The age
//! classifier is pure and has no storage dependency.

mod age;
mod error;
mod store;

pub use age::age_group;
pub use error::{AgeGroupError, CreateUserError, UserStoreError};
pub use store::{create_user, list_users};

#[cfg(test)]
mod tests;
