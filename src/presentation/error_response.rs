// Mapping of service errors onto HTTP responses
use crate::error::ApiError;
use crate::infrastructure::navigator::SIGN_IN_ROUTE;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use serde_json::json;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::SessionExpired | ApiError::MissingRefreshToken => {
                return Redirect::to(SIGN_IN_ROUTE).into_response();
            }
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::EmptyExport => StatusCode::NOT_FOUND,
            ApiError::Csv(_) | ApiError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Status(_)
            | ApiError::Transport(_)
            | ApiError::HtmlResponse
            | ApiError::NonJson
            | ApiError::UnexpectedFormat
            | ApiError::Decode(_) => StatusCode::BAD_GATEWAY,
        };

        tracing::error!("Request failed: {}", self);
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
