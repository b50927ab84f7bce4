use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use logscope_core::AppError;
use tracing::{error, warn};

mod types;

pub use types::ErrorResponse;

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Backend { .. } => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        match &self.0 {
            AppError::Backend { retryable, .. } => {
                warn!(error = %self.0, retryable, "upstream request failed");
            }
            AppError::Internal(_) => error!(error = %self.0, "request failed"),
            _ => {}
        }

        let payload = Json(ErrorResponse::new(
            self.0.to_string(),
            self.0.is_retryable(),
        ));

        (status, payload).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;
