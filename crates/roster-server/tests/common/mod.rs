#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use roster_db::{DatabaseUrl, RegistrySettings};
use roster_server::{app, AppState};
use roster_types::RunMode;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

/// A router over an on-disk database that outlives each request's registry.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    _dir: TempDir,
}

impl TestApp {
    pub fn new(mode: RunMode) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let url = DatabaseUrl::File(dir.path().join("roster.db"));
        let state = AppState::new(mode, url, RegistrySettings::default());
        Self {
            router: app(state.clone()),
            state,
            _dir: dir,
        }
    }

    pub fn development() -> Self {
        Self::new(RunMode::Development)
    }

    pub fn database_path(&self) -> std::path::PathBuf {
        self._dir.path().join("roster.db")
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> Response<Body> {
        self.send(
            Request::builder()
                .uri(uri)
                .method("POST")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
