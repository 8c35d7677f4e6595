//! Per-request storage lifecycle.
//!
//! [`storage_scope`] wraps every route. It opens a fresh
//! [`ConnectionRegistry`] before the request reaches the router, hands
//! handlers a [`StorageHandle`] through request extensions, and closes the
//! registry once the response is produced. Nothing about the registry
//! outlives the request, so a process whose event loop is torn down and
//! recreated between invocations never sees a stale connection.
//!
//! Teardown is tied to [`ScopedRegistry`]: the normal path closes it
//! explicitly off the executor, and its `Drop` releases the registry on
//! every other exit (handler panic, dropped request future).

use axum::{body::Body, extract::Request, middleware::Next, response::Response};
use roster_db::ConnectionRegistry;
use rusqlite::Connection;
use std::sync::Arc;

use crate::api::ApiError;
use crate::AppState;

/// A request's access to its connection registry.
///
/// Extract it in a handler with `Extension<StorageHandle>`.
#[derive(Clone, Debug)]
pub struct StorageHandle(Arc<ConnectionRegistry>);

impl StorageHandle {
    /// Sequence number of the underlying registry.
    pub fn generation(&self) -> u64 {
        self.0.generation()
    }

    /// Runs `f` with a connection on the blocking pool.
    ///
    /// The outer `Result` carries infrastructure failures (no connection,
    /// task panicked) already mapped to a 500; the inner one is whatever
    /// `f` returned.
    pub async fn with_connection<T, E, F>(&self, f: F) -> Result<Result<T, E>, ApiError>
    where
        F: FnOnce(&Connection) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        let registry = Arc::clone(&self.0);
        tokio::task::spawn_blocking(move || {
            let conn = registry.connection().map_err(|e| {
                tracing::error!(generation = registry.generation(), "{}", e);
                ApiError::InternalServerError(format!("db connection failed: {}", e))
            })?;
            Ok(f(&conn))
        })
        .await
        .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))?
    }
}

/// Owns a request's registry until the request is finished with it.
struct ScopedRegistry {
    registry: Option<Arc<ConnectionRegistry>>,
}

impl ScopedRegistry {
    fn new(registry: ConnectionRegistry) -> Self {
        Self {
            registry: Some(Arc::new(registry)),
        }
    }

    fn handle(&self) -> Option<StorageHandle> {
        self.registry.as_ref().map(|r| StorageHandle(Arc::clone(r)))
    }

    async fn close(mut self) {
        let Some(registry) = self.registry.take() else {
            return;
        };
        let generation = registry.generation();

        match Arc::try_unwrap(registry) {
            Ok(registry) => {
                if let Err(e) = tokio::task::spawn_blocking(move || registry.close()).await {
                    tracing::error!(generation, "registry teardown task failed: {}", e);
                }
            }
            Err(shared) => {
                // A blocking task spawned by the handler still holds a
                // handle. The registry closes when that task drops it.
                tracing::warn!(
                    generation,
                    handles = Arc::strong_count(&shared),
                    "registry still referenced after request, deferring close"
                );
            }
        }
    }
}

impl Drop for ScopedRegistry {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.take() {
            tracing::warn!(
                generation = registry.generation(),
                "request ended abnormally, releasing connection registry"
            );
        }
    }
}

/// Opens a connection registry for the request and closes it afterwards.
///
/// A request that already carries a [`StorageHandle`] is passed through
/// untouched; whoever attached the handle owns its teardown.
///
/// Initialization failure short-circuits with a 500 before the router runs.
pub async fn storage_scope(mut req: Request<Body>, next: Next) -> Result<Response, ApiError> {
    if req.extensions().get::<StorageHandle>().is_some() {
        return Ok(next.run(req).await);
    }

    let state = req
        .extensions()
        .get::<Arc<AppState>>()
        .cloned()
        .ok_or_else(|| ApiError::InternalServerError("application state missing".to_string()))?;

    let registry = tokio::task::spawn_blocking(move || state.open_registry())
        .await
        .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))?
        .map_err(|e| {
            tracing::error!("storage initialization failed: {}", e);
            ApiError::InternalServerError(format!("storage initialization failed: {}", e))
        })?;

    let scope = ScopedRegistry::new(registry);
    if let Some(handle) = scope.handle() {
        req.extensions_mut().insert(handle);
    }

    let response = next.run(req).await;
    scope.close().await;

    Ok(response)
}
