//! Shared types and constants for the roster service.
//!
//! Every other crate in the workspace pulls its domain vocabulary from here:
//! the persisted [`User`] record, the [`NewUser`] creation input, the
//! [`AgeGroup`] classification labels, and the [`RunMode`] that gates
//! development-only behavior such as schema generation and API docs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Maximum length of a user's name, in characters.
pub const MAX_NAME_LEN: usize = 50;

/// Maximum length of a user's email address, in characters.
pub const MAX_EMAIL_LEN: usize = 100;

/// A user record as stored in the `users` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Storage-assigned identifier. Immutable once created.
    pub id: i64,
    /// Full name. Not unique.
    pub name: String,
    /// Email address. Unique across all users.
    pub email: String,
}

/// Input for creating a user. The identifier is assigned by storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

/// Age bracket produced by the age classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgeGroup {
    /// Ages 1 through 17.
    Underage,
    /// Ages 18 through 63.
    Adult,
    /// Ages 64 and above.
    Senior,
}

impl AgeGroup {
    /// Returns the wire label for this group.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Underage => "underage",
            Self::Adult => "adult",
            Self::Senior => "senior",
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Execution mode of the service.
///
/// Development mode generates the database schema on every registry
/// initialization and mounts the interactive API docs. Production does
/// neither.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Development,
    #[default]
    Production,
}

/// Error returned when a run mode label is not recognized.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown run mode: {0}")]
pub struct UnknownRunMode(pub String);

impl RunMode {
    /// Returns `true` in development mode.
    pub fn is_development(self) -> bool {
        self == Self::Development
    }

    /// Returns the canonical label for this mode.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }

    /// Interprets an environment label.
    ///
    /// Only `development` (case-insensitive) selects development mode; any
    /// other value runs as production.
    pub fn from_env_label(label: &str) -> Self {
        label.parse().unwrap_or_default()
    }
}

impl FromStr for RunMode {
    type Err = UnknownRunMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            _ => Err(UnknownRunMode(s.to_string())),
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
