// ── HTTP error responses ──
//
// Every handler failure becomes `{ "error_code", "message" }` with a
// matching status code.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use printfleet_core::CoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Upstream unreachable or misbehaving.
    #[error("Bad gateway: {0}")]
    BadGateway(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::BadGateway(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Conflict(_) => "CONFLICT",
            Self::BadGateway(_) => "BAD_GATEWAY",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::NotFound(msg)
            | Self::BadRequest(msg)
            | Self::Conflict(msg)
            | Self::BadGateway(msg)
            | Self::Internal(msg) => msg,
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::AlreadyExists { .. } => Self::Conflict(err.to_string()),
            CoreError::DeviceNotFound { .. } | CoreError::RoutesNotFound { .. } => {
                Self::NotFound(err.to_string())
            }
            CoreError::ValidationFailed { .. } => Self::BadRequest(err.to_string()),
            CoreError::Upstream { .. } => Self::BadGateway(err.to_string()),
            CoreError::Persistence { .. } | CoreError::Config { .. } | CoreError::Internal(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_code = self.error_code();
        let message = self.message();

        if status.is_server_error() {
            tracing::error!(status = %status, error_code, reason = message, "request error");
        } else {
            tracing::debug!(status = %status, error_code, reason = message, "request rejected");
        }

        let body = Json(json!({
            "error_code": error_code,
            "message": message,
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_statuses() {
        let cases = [
            (CoreError::AlreadyExists { id: "1".into() }, StatusCode::CONFLICT),
            (CoreError::DeviceNotFound { id: "1".into() }, StatusCode::NOT_FOUND),
            (
                CoreError::ValidationFailed {
                    message: "port".into(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                CoreError::Persistence {
                    message: "disk".into(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }
}
