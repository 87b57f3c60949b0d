use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rl_core::Error;
use tracing::error;

/// Maps domain errors onto HTTP statuses at the handler boundary.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("request failed: {}", self.0);
        }

        (status, self.0.to_string()).into_response()
    }
}
