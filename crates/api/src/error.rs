//! JSON error responses.
//!
//! Every failure leaves the API as `{"error": <code>, "message": <text>}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use hrflow_core::approval::ApprovalError;
use hrflow_db::repositories::ApprovalFlowError;
use hrflow_shared::AppError;

/// Builds an error response.
pub fn error_response(status: StatusCode, code: &str, message: &str) -> Response {
    (status, Json(json!({ "error": code, "message": message }))).into_response()
}

/// Renders an application error.
pub fn app_error_response(e: &AppError) -> Response {
    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    error_response(status, e.error_code(), &e.public_message())
}

/// Renders an approval engine error. Internal failures are logged and
/// reported without detail.
pub fn approval_error_response(e: ApprovalError) -> Response {
    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let code = e.error_code();
    if status.is_server_error() {
        error!(error = %e, "Approval operation failed");
    }
    let message = AppError::from(e).public_message();
    error_response(status, code, &message)
}

/// Renders a flow configuration error.
pub fn flow_error_response(e: ApprovalFlowError) -> Response {
    match e {
        ApprovalFlowError::NotFound(id) => error_response(
            StatusCode::NOT_FOUND,
            "flow_not_found",
            &format!("Approval flow {id} not found"),
        ),
        ApprovalFlowError::AlreadyExists { .. } => {
            error_response(StatusCode::CONFLICT, "flow_exists", &e.to_string())
        }
        ApprovalFlowError::InUse(_) => {
            error_response(StatusCode::CONFLICT, "flow_in_use", &e.to_string())
        }
        ApprovalFlowError::Invalid(inner) => approval_error_response(inner),
        ApprovalFlowError::Malformed(_) | ApprovalFlowError::Database(_) => {
            error!(error = %e, "Approval flow operation failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "An error occurred",
            )
        }
    }
}
