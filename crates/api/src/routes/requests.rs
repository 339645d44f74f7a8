//! Handlers shared by the leave, project and task routes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use hrflow_core::approval::{Approvable, ApprovalError};
use hrflow_db::repositories::ApprovalStore;
use hrflow_shared::AppError;

use crate::{
    AppState,
    error::{app_error_response, approval_error_response},
    middleware::AuthUser,
};

/// A request plus its human-readable status, e.g. `Pending for HR`.
#[derive(Debug, Serialize)]
pub struct RequestView<R> {
    /// The stored request.
    #[serde(flatten)]
    pub request: R,
    /// Display form of the overall status.
    pub status: String,
}

impl<R: Approvable> RequestView<R> {
    /// Wraps a request.
    pub fn new(request: R) -> Self {
        let status = request.approval_state().overall_status.to_string();
        Self { request, status }
    }
}

/// The applicant and everyone already routed to may read a request.
pub fn can_view<R: Approvable + ?Sized>(request: &R, employee_id: &str) -> bool {
    request.applicant_id() == employee_id
        || request
            .approval_state()
            .trail
            .iter()
            .any(|e| e.employee_id == employee_id)
}

/// 201 with the new request, or the submission error.
pub fn created<R: Approvable + Serialize>(result: Result<R, ApprovalError>) -> Response {
    match result {
        Ok(request) => (StatusCode::CREATED, Json(RequestView::new(request))).into_response(),
        Err(e) => approval_error_response(e),
    }
}

/// Requests filed by the caller.
pub async fn list_mine<S>(state: &AppState, store: &S, auth: &AuthUser) -> Response
where
    S: ApprovalStore,
    S::Request: Serialize,
{
    match state.approvals.submitted_by(store, auth.employee_id()).await {
        Ok(requests) => {
            let data: Vec<_> = requests.into_iter().map(RequestView::new).collect();
            (StatusCode::OK, Json(json!({ "data": data }))).into_response()
        }
        Err(e) => approval_error_response(e),
    }
}

/// One request, if the caller may see it.
pub async fn get_one<S>(state: &AppState, store: &S, auth: &AuthUser, id: Uuid) -> Response
where
    S: ApprovalStore,
    S::Request: Serialize,
{
    match state.approvals.get(store, id).await {
        Ok(request) if can_view(&request, auth.employee_id()) => {
            (StatusCode::OK, Json(RequestView::new(request))).into_response()
        }
        Ok(_) => forbidden(),
        Err(e) => approval_error_response(e),
    }
}

/// Withdraws one of the caller's open requests.
pub async fn withdraw<S: ApprovalStore>(
    state: &AppState,
    store: &S,
    auth: &AuthUser,
    id: Uuid,
) -> Response {
    match state.approvals.withdraw(store, id, auth.employee_id()).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => approval_error_response(e),
    }
}

/// 403 for callers who are neither applicant nor approver.
pub fn forbidden() -> Response {
    app_error_response(&AppError::Forbidden(
        "You are not involved in this request".to_string(),
    ))
}
