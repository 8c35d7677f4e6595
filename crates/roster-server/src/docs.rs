//! OpenAPI documentation.
//!
//! The document is always served at `/openapi.json`. Swagger UI is mounted
//! at `/docs` only in development mode.

use crate::api::{ErrorResponse, FieldError, MessageResponse, ValidationErrorResponse};
use crate::api_users::{AgeGroupResponse, UserIn, UserOut};
use axum::{routing::get, Json, Router};
use roster_types::RunMode;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// OpenAPI document for the HTTP API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Roster API",
        description = "User registry with create and list operations, plus health probes."
    ),
    paths(
        crate::api::root_handler,
        crate::api::ping_handler,
        crate::api_users::list_users_handler,
        crate::api_users::create_user_handler,
        crate::api_users::age_group_handler,
    ),
    components(schemas(
        UserIn,
        UserOut,
        AgeGroupResponse,
        MessageResponse,
        ErrorResponse,
        ValidationErrorResponse,
        FieldError
    )),
    tags(
        (name = "users", description = "User operations"),
        (name = "health", description = "Liveness endpoints")
    )
)]
pub struct ApiDoc;

/// Routes exposing the API documentation for the given mode.
pub fn routes(mode: RunMode) -> Router {
    if mode.is_development() {
        Router::new().merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
    } else {
        Router::new().route("/openapi.json", get(openapi_handler))
    }
}

async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
