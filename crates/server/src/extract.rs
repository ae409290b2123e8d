//! `Json` and `Query` wrappers whose rejections are `AppError`s, so a body
//! or query string that fails to deserialize answers 400 `ValidationError`
//! with the offending field named, like every other validation failure.

use std::collections::HashMap;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use shared_types::AppError;

/// JSON request body extractor and response wrapper.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

impl<T, S> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Json(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Query string extractor.
#[derive(Debug, Clone, Copy, Default)]
pub struct Query<T>(pub T);

impl<T, S> FromRequestParts<S> for Query<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Query::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Query(value)) => Ok(Query(value)),
            Err(rejection) => Err(query_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> AppError {
    match rejection {
        JsonRejection::JsonDataError(e) => deserialize_error(&e.body_text()),
        JsonRejection::JsonSyntaxError(_) => {
            AppError::validation("Request body is not valid JSON", HashMap::new())
        }
        JsonRejection::MissingJsonContentType(_) => AppError::validation(
            "Expected request with `Content-Type: application/json`",
            HashMap::new(),
        ),
        other => {
            tracing::debug!(error = %other.body_text(), "Request body rejected");
            AppError::bad_request(other.body_text())
        }
    }
}

fn query_rejection(rejection: QueryRejection) -> AppError {
    match rejection {
        QueryRejection::FailedToDeserializeQueryString(e) => deserialize_error(&e.body_text()),
        other => AppError::validation(other.body_text(), HashMap::new()),
    }
}

/// Turn axum's `<prefix>: <path>: <serde message>` text into a validation
/// error keyed by the field path.
fn deserialize_error(body_text: &str) -> AppError {
    let detail = body_text
        .split_once(": ")
        .map_or(body_text, |(_, detail)| detail);
    let (field, message) = split_field(detail);
    let message = message.split(" at line ").next().unwrap_or(message);

    match field {
        Some(field) => AppError::invalid_field(&field, message),
        None => AppError::validation(message, HashMap::new()),
    }
}

fn split_field(detail: &str) -> (Option<String>, &str) {
    if let Some((path, message)) = detail.split_once(": ") {
        let is_path = !path.is_empty()
            && path
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']'));
        if is_path {
            return (Some(path.to_string()), message);
        }
    }

    // Root-level errors carry no path but still name the field.
    let field = detail
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split('`').next())
        .map(str::to_string);
    (field, detail)
}
