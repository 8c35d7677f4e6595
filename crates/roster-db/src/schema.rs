//! Schema generation from embedded table definitions.
//!
//! Table definitions are SQL files compiled into the binary. Generation is
//! not versioned: a table that already exists is left untouched, a missing
//! one is created. There is no upgrade path for a table whose definition
//! has changed.

use rusqlite::Connection;
use thiserror::Error;

/// A single embedded table definition.
struct TableSchema {
    name: &'static str,
    sql: &'static str,
}

/// Every table the service owns, in creation order.
const TABLES: &[TableSchema] = &[TableSchema {
    name: "users",
    sql: include_str!("schema/users.sql"),
}];

/// Errors that can occur during schema generation.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A table definition failed to execute.
    #[error("creating table '{name}' failed: {source}")]
    CreateFailed {
        /// The table being created.
        name: String,
        /// The underlying SQLite error.
        source: rusqlite::Error,
    },

    /// Failed to inspect the existing schema.
    #[error("failed to inspect schema: {0}")]
    Inspect(rusqlite::Error),
}

/// Creates every table that does not exist yet.
///
/// Returns the number of tables created; `0` means the schema was already
/// complete.
///
/// # Errors
///
/// Returns `SchemaError` if the schema cannot be inspected or a table
/// definition fails to apply.
pub fn generate_schemas(conn: &Connection) -> Result<usize, SchemaError> {
    generate_from_list(conn, TABLES)
}

fn generate_from_list(conn: &Connection, tables: &[TableSchema]) -> Result<usize, SchemaError> {
    let mut created = 0;

    for table in tables {
        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
                [table.name],
                |row| row.get(0),
            )
            .map_err(SchemaError::Inspect)?;

        if exists {
            tracing::debug!(table = table.name, "table already exists, skipping");
            continue;
        }

        tracing::info!(table = table.name, "generating table");

        let tx = conn
            .unchecked_transaction()
            .map_err(|e| SchemaError::CreateFailed {
                name: table.name.to_string(),
                source: e,
            })?;

        tx.execute_batch(table.sql)
            .map_err(|e| SchemaError::CreateFailed {
                name: table.name.to_string(),
                source: e,
            })?;

        tx.commit().map_err(|e| SchemaError::CreateFailed {
            name: table.name.to_string(),
            source: e,
        })?;

        created += 1;
    }

    Ok(created)
}
