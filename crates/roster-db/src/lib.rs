//! Database layer for the roster service.
//!
//! The service may run on ephemeral compute where nothing in the process
//! survives between invocations, so there is no process-wide pool. Each
//! request opens its own [`ConnectionRegistry`], uses it, and closes it.
//!
//! - [`DatabaseUrl`] parses the configured connection string.
//! - [`ConnectionRegistry`] is an `r2d2` pool over SQLite scoped to a single
//!   request. Opening it eagerly establishes a connection, so an unreachable
//!   database fails the request before any handler runs.
//! - [`RegistryTracker`] counts live registries and numbers each one.
//! - [`maintenance_threads`] is the single worker pool every registry
//!   schedules connection setup on.
//! - [`generate_schemas`] creates missing tables. It runs only when the
//!   caller asks for it (development mode).

mod registry;
mod schema;
mod url;

pub use registry::{
    maintenance_threads, ConnectionRegistry, DbConnection, DbPool, RegistryError,
    RegistrySettings, RegistryTracker,
};
pub use scheduled_thread_pool::ScheduledThreadPool;
pub use schema::{generate_schemas, SchemaError};
pub use url::{DatabaseUrl, DatabaseUrlError};
