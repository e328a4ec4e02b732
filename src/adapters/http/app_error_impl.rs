use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::app_error::{AppError, ErrorCode};

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error before it gets converted into a status response.
        tracing::error!(error = ?self, "Request failed");

        let code = self.code();
        match self {
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "success": false,
                    "code": code.as_str(),
                    "message": "Validation failed",
                    "errors": errors,
                })),
            )
                .into_response(),
            AppError::Unauthenticated(msg) => error_resp(StatusCode::UNAUTHORIZED, code, msg),
            AppError::Forbidden(msg) => error_resp(StatusCode::FORBIDDEN, code, msg),
            AppError::NotFound(msg) => error_resp(StatusCode::NOT_FOUND, code, msg),
            AppError::Conflict(msg) => error_resp(StatusCode::CONFLICT, code, msg),
            AppError::UpstreamUnavailable(msg)
            | AppError::Database(msg)
            | AppError::Internal(msg) => error_resp(StatusCode::INTERNAL_SERVER_ERROR, code, msg),
        }
    }
}

fn error_resp(status: StatusCode, code: ErrorCode, message: String) -> Response {
    let body = json!({ "success": false, "code": code.as_str(), "message": message });
    (status, Json(body)).into_response()
}
