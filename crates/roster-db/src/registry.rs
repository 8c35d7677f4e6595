//! Request-scoped connection registries.

use crate::schema::{generate_schemas, SchemaError};
use crate::url::DatabaseUrl;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;
use scheduled_thread_pool::ScheduledThreadPool;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// A type alias for the SQLite connection pool backing a registry.
pub type DbPool = Pool<SqliteConnectionManager>;

/// A connection checked out of a registry.
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Builds the worker pool r2d2 schedules connection setup on.
///
/// One pool is shared by every registry in the process. Without it each
/// registry would start and join its own worker threads.
pub fn maintenance_threads() -> Arc<ScheduledThreadPool> {
    Arc::new(ScheduledThreadPool::with_name("roster-db-worker-{}", 1))
}

/// Runtime tunables for registry connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrySettings {
    /// Busy timeout for SQLite connections, in milliseconds.
    pub busy_timeout_ms: u64,

    /// How long opening a registry may wait for its first connection, in
    /// milliseconds.
    pub connect_timeout_ms: u64,

    /// Maximum number of connections a single registry may hold.
    pub pool_max_size: u32,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
            connect_timeout_ms: 2_000,
            pool_max_size: 1,
        }
    }
}

/// Errors that can occur when opening or using a registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The first connection could not be established.
    #[error("failed to open database connection registry: {0}")]
    Open(#[from] r2d2::Error),

    /// Schema generation failed during initialization.
    #[error("failed to generate database schema: {0}")]
    Schema(#[from] SchemaError),

    /// A connection could not be checked out of an open registry.
    #[error("failed to get database connection: {0}")]
    Checkout(r2d2::Error),
}

#[derive(Debug, Default)]
struct TrackerState {
    active: AtomicUsize,
    opened: AtomicU64,
}

/// Counts live registries and numbers each new one.
///
/// Cloning shares the counters. A registry is counted from the moment it
/// opens successfully until it is dropped.
#[derive(Debug, Clone, Default)]
pub struct RegistryTracker {
    state: Arc<TrackerState>,
}

impl RegistryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registries currently open.
    pub fn active(&self) -> usize {
        self.state.active.load(Ordering::SeqCst)
    }

    /// Number of registries opened so far.
    pub fn opened(&self) -> u64 {
        self.state.opened.load(Ordering::SeqCst)
    }

    fn lease(&self) -> RegistryLease {
        let generation = self.state.opened.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.active.fetch_add(1, Ordering::SeqCst);
        RegistryLease {
            state: Arc::clone(&self.state),
            generation,
        }
    }
}

/// Decrements the live count when the owning registry goes away.
struct RegistryLease {
    state: Arc<TrackerState>,
    generation: u64,
}

impl Drop for RegistryLease {
    fn drop(&mut self) {
        self.state.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// The set of database connections belonging to one request.
///
/// Dropping the registry closes every idle connection it holds. Connections
/// still checked out close as soon as they are returned.
pub struct ConnectionRegistry {
    pool: DbPool,
    lease: RegistryLease,
}

impl ConnectionRegistry {
    /// Opens a registry and establishes its first connection.
    ///
    /// When `generate` is set, missing tables are created on that first
    /// connection before the registry is handed out. Connection setup runs
    /// on `workers`, which the caller shares between registries. This call
    /// blocks; run it off the async executor.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Open` if no connection can be established
    /// within `settings.connect_timeout_ms`, or `RegistryError::Schema` if
    /// schema generation fails.
    pub fn open(
        url: &DatabaseUrl,
        settings: RegistrySettings,
        tracker: &RegistryTracker,
        workers: &Arc<ScheduledThreadPool>,
        generate: bool,
    ) -> Result<Self, RegistryError> {
        let pool = build_pool(url, settings, workers)?;

        if generate {
            let conn = pool.get().map_err(RegistryError::Checkout)?;
            let created = generate_schemas(&conn)?;
            if created > 0 {
                tracing::info!(count = created, "generated database tables");
            }
        }

        let lease = tracker.lease();
        tracing::debug!(generation = lease.generation, %url, "opened connection registry");

        Ok(Self { pool, lease })
    }

    /// Checks out a connection.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Checkout` if every connection is in use and
    /// none frees up within the connect timeout, or a new one cannot be
    /// established.
    pub fn connection(&self) -> Result<DbConnection, RegistryError> {
        self.pool.get().map_err(RegistryError::Checkout)
    }

    /// Sequence number of this registry within its tracker, starting at 1.
    pub fn generation(&self) -> u64 {
        self.lease.generation
    }

    /// Closes all connections and releases the registry.
    pub fn close(self) {
        let generation = self.lease.generation;
        drop(self);
        tracing::debug!(generation, "closed connection registry");
    }
}

impl fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("generation", &self.lease.generation)
            .field("max_size", &self.pool.max_size())
            .finish()
    }
}

fn build_pool(
    url: &DatabaseUrl,
    settings: RegistrySettings,
    workers: &Arc<ScheduledThreadPool>,
) -> Result<DbPool, r2d2::Error> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;

    let manager = match url {
        DatabaseUrl::Memory => SqliteConnectionManager::memory(),
        DatabaseUrl::File(path) => SqliteConnectionManager::file(path),
    };

    let busy_timeout_ms = settings.busy_timeout_ms;
    let manager = manager.with_flags(flags).with_init(move |conn| {
        // In-memory databases report "memory" and cannot switch to WAL.
        let journal_mode: String =
            conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;
        if journal_mode != "wal" && journal_mode != "memory" {
            return Err(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
                Some(format!(
                    "failed to set WAL journal mode, got: {}",
                    journal_mode
                )),
            ));
        }
        conn.execute_batch(&format!(
            "PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = {};",
            busy_timeout_ms
        ))
    });

    // r2d2 panics on a zero size or timeout. A registry lives for one
    // request, so there is nothing for the reaper to expire.
    Pool::builder()
        .max_size(settings.pool_max_size.max(1))
        .min_idle(Some(1))
        .idle_timeout(None)
        .max_lifetime(None)
        .connection_timeout(Duration::from_millis(settings.connect_timeout_ms.max(1)))
        .thread_pool(Arc::clone(workers))
        .build(manager)
}
