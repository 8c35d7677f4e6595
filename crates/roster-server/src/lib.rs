//! Roster server library logic.

pub mod api;
pub mod api_users;
pub mod config;
pub mod docs;
pub mod extract;
pub mod middleware;

use axum::{extract::DefaultBodyLimit, routing::get, Extension, Router};
use roster_db::{
    maintenance_threads, ConnectionRegistry, DatabaseUrl, RegistryError, RegistrySettings,
    RegistryTracker, ScheduledThreadPool,
};
use roster_types::RunMode;
use std::fmt;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
///
/// Holds only what is needed to open a registry. No connection lives here.
#[derive(Clone)]
pub struct AppState {
    /// Execution mode.
    pub mode: RunMode,
    /// Where the database lives.
    pub database_url: DatabaseUrl,
    /// Tunables applied to every registry.
    pub registry_settings: RegistrySettings,
    /// Live registry counter.
    pub registries: RegistryTracker,
    /// Worker thread shared by every registry's connection setup.
    pub workers: Arc<ScheduledThreadPool>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("mode", &self.mode)
            .field("database_url", &self.database_url)
            .field("registry_settings", &self.registry_settings)
            .field("registries", &self.registries)
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(mode: RunMode, database_url: DatabaseUrl, registry_settings: RegistrySettings) -> Self {
        Self {
            mode,
            database_url,
            registry_settings,
            registries: RegistryTracker::new(),
            workers: maintenance_threads(),
        }
    }

    /// Opens a fresh registry, generating the schema in development mode.
    ///
    /// Blocks; call from a blocking task.
    pub fn open_registry(&self) -> Result<ConnectionRegistry, RegistryError> {
        ConnectionRegistry::open(
            &self.database_url,
            self.registry_settings,
            &self.registries,
            &self.workers,
            self.mode.is_development(),
        )
    }
}

/// Maximum request body size (64 KiB). User payloads are two short strings.
const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let router = Router::new()
        .route("/", get(api::root_handler))
        .route("/ping", get(api::ping_handler))
        .route(
            "/users/",
            get(api_users::list_users_handler).post(api_users::create_user_handler),
        )
        .route(
            "/users",
            get(api_users::list_users_handler).post(api_users::create_user_handler),
        )
        .route("/users/group", get(api_users::age_group_handler))
        .merge(docs::routes(state.mode));

    router
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(axum::middleware::from_fn(middleware::storage_scope))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
