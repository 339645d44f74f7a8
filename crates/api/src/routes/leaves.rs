//! Leave request routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::Response,
    routing::{get, post},
};
use uuid::Uuid;

use hrflow_core::approval::RequestKind;
use hrflow_core::requests::{LeaveRequest, NewLeaveRequest};

use super::requests;
use crate::{AppState, error::approval_error_response, middleware::AuthUser};

/// Creates the leave routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/leaves", post(create_leave))
        .route("/leaves/mine", get(list_my_leaves))
        .route("/leaves/{id}", get(get_leave).delete(withdraw_leave))
}

/// POST `/leaves` - Submit a leave request.
async fn create_leave(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<NewLeaveRequest>,
) -> Response {
    if let Err(e) = payload.validate() {
        return approval_error_response(e);
    }

    let applicant_id = auth.employee_id().to_string();
    let result = state
        .approvals
        .submit(&state.leaves, RequestKind::Leave, auth.employee_id(), move |ctx| {
            LeaveRequest {
                id: ctx.request_id.into(),
                applicant_id,
                flow_id: ctx.flow_id,
                leave_type: payload.leave_type,
                start_date: payload.start_date,
                end_date: payload.end_date,
                days: payload.days,
                reason: payload.reason,
                approval: ctx.approval,
                version: 1,
                created_at: ctx.now,
                updated_at: ctx.now,
            }
        })
        .await;

    requests::created(result)
}

/// GET `/leaves/mine` - Leave requests filed by the caller.
async fn list_my_leaves(State(state): State<AppState>, auth: AuthUser) -> Response {
    requests::list_mine(&state, &state.leaves, &auth).await
}

/// GET `/leaves/{id}` - One leave request.
async fn get_leave(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Response {
    requests::get_one(&state, &state.leaves, &auth, id).await
}

/// DELETE `/leaves/{id}` - Withdraw an open leave request.
async fn withdraw_leave(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Response {
    requests::withdraw(&state, &state.leaves, &auth, id).await
}
