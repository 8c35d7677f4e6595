//! Connection string parsing.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Location of the SQLite database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseUrl {
    /// A private in-memory database. Its contents vanish when the registry
    /// that opened it closes.
    Memory,
    /// A database file on disk.
    File(PathBuf),
}

/// Errors that can occur when parsing a connection string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DatabaseUrlError {
    /// The string has no `scheme:` prefix.
    #[error("database url has no scheme: {0}")]
    MissingScheme(String),

    /// The scheme is not one we can open.
    #[error("unsupported database scheme '{0}', expected 'sqlite'")]
    UnsupportedScheme(String),

    /// `sqlite://` with nothing after it.
    #[error("database url has an empty path")]
    EmptyPath,
}

impl FromStr for DatabaseUrl {
    type Err = DatabaseUrlError;

    /// Accepts `sqlite://<path>`, `sqlite:<path>` and `sqlite://:memory:`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (scheme, rest) = s
            .split_once(':')
            .ok_or_else(|| DatabaseUrlError::MissingScheme(s.to_string()))?;

        if !scheme.eq_ignore_ascii_case("sqlite") {
            return Err(DatabaseUrlError::UnsupportedScheme(scheme.to_string()));
        }

        let path = rest.strip_prefix("//").unwrap_or(rest);
        match path {
            "" => Err(DatabaseUrlError::EmptyPath),
            ":memory:" => Ok(Self::Memory),
            p => Ok(Self::File(PathBuf::from(p))),
        }
    }
}

impl fmt::Display for DatabaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str("sqlite://:memory:"),
            Self::File(path) => write!(f, "sqlite://{}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_relative_and_absolute_paths() {
        assert_eq!(
            "sqlite://db.sqlite3".parse(),
            Ok(DatabaseUrl::File(PathBuf::from("db.sqlite3")))
        );
        assert_eq!(
            "sqlite:///var/lib/roster/db.sqlite3".parse(),
            Ok(DatabaseUrl::File(PathBuf::from("/var/lib/roster/db.sqlite3")))
        );
        assert_eq!(
            "sqlite:data.db".parse(),
            Ok(DatabaseUrl::File(PathBuf::from("data.db")))
        );
    }

    #[test]
    fn parses_memory_url() {
        assert_eq!("sqlite://:memory:".parse(), Ok(DatabaseUrl::Memory));
        assert_eq!("SQLITE::memory:".parse(), Ok(DatabaseUrl::Memory));
    }

    #[test]
    fn rejects_other_schemes_and_bare_paths() {
        assert_eq!(
            "postgres://localhost/roster".parse::<DatabaseUrl>(),
            Err(DatabaseUrlError::UnsupportedScheme("postgres".to_string()))
        );
        assert_eq!(
            "db.sqlite3".parse::<DatabaseUrl>(),
            Err(DatabaseUrlError::MissingScheme("db.sqlite3".to_string()))
        );
        assert_eq!(
            "sqlite://".parse::<DatabaseUrl>(),
            Err(DatabaseUrlError::EmptyPath)
        );
    }

    #[test]
    fn display_uses_canonical_form() {
        let url: DatabaseUrl = "sqlite:data.db".parse().unwrap();
        assert_eq!(url.to_string(), "sqlite://data.db");
        assert_eq!(DatabaseUrl::Memory.to_string(), "sqlite://:memory:");
    }
}
