//! Request extractors that reject with [`ApiError`] bodies.
//!
//! axum's own `Json` and `Query` reject with plain text. These wrappers run
//! the stock extractor and convert its rejection, so a malformed request
//! gets the same JSON error envelope as every other failure.

use crate::api::{ApiError, FieldError};
use axum::{
    extract::{
        rejection::{JsonDataError, JsonRejection, QueryRejection},
        FromRequest, FromRequestParts, Query, Request,
    },
    http::{request::Parts, StatusCode},
    Json,
};
use serde::de::DeserializeOwned;
use std::error::Error as _;

/// JSON request body.
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// Query string parameters.
#[derive(Debug)]
pub struct ApiQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => ApiError::Validation(vec![data_error_field(&err)]),
            JsonRejection::MissingJsonContentType(err) => {
                ApiError::UnsupportedMediaType(err.body_text())
            }
            other if other.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                ApiError::PayloadTooLarge(other.body_text())
            }
            other => ApiError::BadRequest(other.body_text()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Pins a body that parsed as JSON but did not fit the target type to the
/// field at fault.
fn data_error_field(err: &JsonDataError) -> FieldError {
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(located) =
            cause.downcast_ref::<serde_path_to_error::Error<serde_json::Error>>()
        {
            let message = strip_position(&located.inner().to_string()).to_string();
            let field = match missing_field(&message) {
                Some(name) => name.to_string(),
                None => match located.path().to_string() {
                    path if path == "." => "body".to_string(),
                    path => path,
                },
            };
            return FieldError { field, message };
        }
        source = cause.source();
    }

    FieldError {
        field: "body".to_string(),
        message: err.body_text(),
    }
}

/// Missing fields are reported against the enclosing object, so the name
/// only appears in the message.
fn missing_field(message: &str) -> Option<&str> {
    message
        .strip_prefix("missing field `")?
        .split_once('`')
        .map(|(name, _)| name)
}

fn strip_position(message: &str) -> &str {
    message
        .rsplit_once(" at line ")
        .map_or(message, |(head, _)| head)
}
