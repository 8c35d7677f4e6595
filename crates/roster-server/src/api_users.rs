//! User API handlers.
//!
//! `GET /users/` and `POST /users/` go through the request's
//! [`StorageHandle`]; `GET /users/group` is a pure computation.

use crate::api::{ApiError, ErrorResponse, ValidationErrorResponse};
use crate::extract::{ApiJson, ApiQuery};
use crate::middleware::StorageHandle;
use axum::{
    extract::{Extension, Json},
    http::StatusCode,
};
use garde::Validate;
use roster_types::{NewUser, User, MAX_EMAIL_LEN, MAX_NAME_LEN};
use roster_users::{age_group, create_user, list_users, CreateUserError};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Request body for user creation.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UserIn {
    /// Full name, at most 50 characters.
    #[garde(length(chars, max = MAX_NAME_LEN))]
    pub name: String,
    /// A syntactically valid email address, at most 100 characters.
    #[garde(email, length(chars, max = MAX_EMAIL_LEN))]
    pub email: String,
}

/// Wire representation of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserOut {
    pub name: String,
    pub email: String,
}

impl From<User> for UserOut {
    fn from(user: User) -> Self {
        Self {
            name: user.name,
            email: user.email,
        }
    }
}

/// Query string for `GET /users/group`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AgeQuery {
    /// Age in years.
    pub age: i64,
}

/// Response body for `GET /users/group`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AgeGroupResponse {
    pub age_group: String,
}

/// Handler for `GET /users/`.
#[utoipa::path(
    get,
    path = "/users/",
    tag = "users",
    responses(
        (status = 200, description = "All users ordered by name", body = [UserOut]),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn list_users_handler(
    Extension(storage): Extension<StorageHandle>,
) -> Result<Json<Vec<UserOut>>, ApiError> {
    let users = storage
        .with_connection(list_users)
        .await?
        .map_err(|e| {
            tracing::error!(generation = storage.generation(), "listing users failed: {}", e);
            ApiError::InternalServerError("could not list users".to_string())
        })?;

    Ok(Json(users.into_iter().map(UserOut::from).collect()))
}

/// Handler for `POST /users/`.
#[utoipa::path(
    post,
    path = "/users/",
    tag = "users",
    request_body = UserIn,
    responses(
        (status = 201, description = "User created", body = UserOut),
        (status = 400, description = "Email already registered, user could not be created, or malformed JSON", body = ErrorResponse),
        (status = 415, description = "Body is not `application/json`", body = ErrorResponse),
        (status = 422, description = "Missing, mistyped or invalid fields", body = ValidationErrorResponse)
    )
)]
pub async fn create_user_handler(
    Extension(storage): Extension<StorageHandle>,
    ApiJson(payload): ApiJson<UserIn>,
) -> Result<(StatusCode, Json<UserOut>), ApiError> {
    payload.validate()?;

    let new_user = NewUser {
        name: payload.name,
        email: payload.email,
    };

    match storage
        .with_connection(move |conn| create_user(conn, &new_user))
        .await?
    {
        Ok(user) => {
            tracing::info!(user_id = user.id, "created user");
            Ok((StatusCode::CREATED, Json(UserOut::from(user))))
        }
        Err(e @ CreateUserError::DuplicateEmail(_)) => {
            tracing::debug!("rejected user creation: {}", e);
            Err(ApiError::BadRequest(e.to_string()))
        }
        Err(e @ CreateUserError::Database(_)) => {
            tracing::warn!("user creation failed: {}", e);
            Err(ApiError::BadRequest("could not create user".to_string()))
        }
    }
}

/// Handler for `GET /users/group?age=<int>`.
#[utoipa::path(
    get,
    path = "/users/group",
    tag = "users",
    params(AgeQuery),
    responses(
        (status = 200, description = "Age bracket", body = AgeGroupResponse),
        (status = 400, description = "Age is missing, not an integer, or not positive", body = ErrorResponse)
    )
)]
pub async fn age_group_handler(
    ApiQuery(params): ApiQuery<AgeQuery>,
) -> Result<Json<AgeGroupResponse>, ApiError> {
    let group = age_group(params.age).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    Ok(Json(AgeGroupResponse {
        age_group: group.as_str().to_string(),
    }))
}
