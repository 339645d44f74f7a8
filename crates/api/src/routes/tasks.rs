//! Task assignment routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::Response,
    routing::{get, post},
};
use chrono::Utc;
use uuid::Uuid;

use hrflow_core::approval::RequestKind;
use hrflow_core::requests::{NewTaskAssignment, TaskAssignment};

use super::requests;
use crate::{AppState, error::approval_error_response, middleware::AuthUser};

/// Creates the task assignment routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tasks", post(create_task_assignment))
        .route("/tasks/mine", get(list_my_task_assignments))
        .route(
            "/tasks/{id}",
            get(get_task_assignment).delete(withdraw_task_assignment),
        )
}

/// POST `/tasks` - Request that a task be assigned.
async fn create_task_assignment(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<NewTaskAssignment>,
) -> Response {
    if let Err(e) = payload.validate(Utc::now().date_naive()) {
        return approval_error_response(e);
    }

    let applicant_id = auth.employee_id().to_string();
    let result = state
        .approvals
        .submit(
            &state.tasks,
            RequestKind::Task,
            auth.employee_id(),
            move |ctx| TaskAssignment {
                id: ctx.request_id.into(),
                applicant_id,
                flow_id: ctx.flow_id,
                title: payload.title.trim().to_string(),
                assignee_id: payload.assignee_id.trim().to_string(),
                project_id: payload.project_id,
                due_date: payload.due_date,
                approval: ctx.approval,
                version: 1,
                created_at: ctx.now,
                updated_at: ctx.now,
            },
        )
        .await;

    requests::created(result)
}

async fn list_my_task_assignments(State(state): State<AppState>, auth: AuthUser) -> Response {
    requests::list_mine(&state, &state.tasks, &auth).await
}

async fn get_task_assignment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Response {
    requests::get_one(&state, &state.tasks, &auth, id).await
}

async fn withdraw_task_assignment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Response {
    requests::withdraw(&state, &state.tasks, &auth, id).await
}
