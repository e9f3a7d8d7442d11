use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use storefront_core::AppError;
use tracing::error;
use ts_rs::TS;

const INTERNAL_ERROR_MESSAGE: &str = "internal server error";
const UPSTREAM_ERROR_MESSAGE: &str = "upstream service unavailable";

/// API error payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/error-response.ts"
)]
pub struct ErrorResponse {
    message: String,
}

/// HTTP API error wrapper around core application errors.
///
/// Client errors carry their message; upstream and internal failures are
/// logged here and answered with a generic message.
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
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::ExternalService(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = if self.0.is_client_safe() {
            self.0.to_string()
        } else {
            error!(error = %self.0, status = status.as_u16(), "request failed");
            if status == StatusCode::BAD_GATEWAY {
                UPSTREAM_ERROR_MESSAGE.to_owned()
            } else {
                INTERNAL_ERROR_MESSAGE.to_owned()
            }
        };

        (status, Json(ErrorResponse { message })).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;
