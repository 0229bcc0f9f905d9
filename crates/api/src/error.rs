use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use replybot_core::ResolveError;
use tracing::error;

use crate::validate::ValidationError;

const INTERNAL_ERROR_MESSAGE: &str = "Something went wrong";
const BODY_TOO_LARGE_MESSAGE: &str = "request entity too large";

#[derive(Debug)]
pub enum ApiError {
    Validation(ValidationError),
    Resolve(ResolveError),
    Body(BytesRejection),
}

impl From<ValidationError> for ApiError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<BytesRejection> for ApiError {
    fn from(value: BytesRejection) -> Self {
        Self::Body(value)
    }
}

impl From<ResolveError> for ApiError {
    fn from(value: ResolveError) -> Self {
        Self::Resolve(value)
    }
}

pub(crate) fn error_body(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(serde_json::json!({
            "errors": [{ "message": message }]
        })),
    )
        .into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(err) => error_body(StatusCode::BAD_REQUEST, &err.message),
            ApiError::Resolve(err) => {
                error!(kind = err.kind(), error = %err, "reply resolution failed");
                error_body(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
            }
            ApiError::Body(rejection) => {
                let status = rejection.status();
                let message = if status == StatusCode::PAYLOAD_TOO_LARGE {
                    BODY_TOO_LARGE_MESSAGE.to_string()
                } else {
                    rejection.body_text()
                };
                error_body(status, &message)
            }
        }
    }
}
