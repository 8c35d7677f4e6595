mod common;

use axum::http::StatusCode;
use common::{body_json, TestApp};

#[tokio::test]
async fn root_returns_welcome_message() {
    let app = TestApp::development();

    let response = app.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["message"], "¡Hola, mundo!");
}

#[tokio::test]
async fn ping_returns_pong() {
    let app = TestApp::development();

    let response = app.get("/ping").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!({"message": "pong"}));
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let app = TestApp::development();
    let response = app.get("/nope").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
