//! Project assignment routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::Response,
    routing::{get, post},
};
use uuid::Uuid;

use hrflow_core::approval::RequestKind;
use hrflow_core::requests::{NewProjectAssignment, ProjectAssignment};

use super::requests;
use crate::{AppState, error::approval_error_response, middleware::AuthUser};

/// Creates the project assignment routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/projects", post(create_project_assignment))
        .route("/projects/mine", get(list_my_project_assignments))
        .route(
            "/projects/{id}",
            get(get_project_assignment).delete(withdraw_project_assignment),
        )
}

/// POST `/projects` - Request that an employee be put on a project.
async fn create_project_assignment(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<NewProjectAssignment>,
) -> Response {
    if let Err(e) = payload.validate() {
        return approval_error_response(e);
    }

    let applicant_id = auth.employee_id().to_string();
    let result = state
        .approvals
        .submit(
            &state.projects,
            RequestKind::Project,
            auth.employee_id(),
            move |ctx| ProjectAssignment {
                id: ctx.request_id.into(),
                applicant_id,
                flow_id: ctx.flow_id,
                project_name: payload.project_name.trim().to_string(),
                assignee_id: payload.assignee_id.trim().to_string(),
                description: payload.description,
                approval: ctx.approval,
                version: 1,
                created_at: ctx.now,
                updated_at: ctx.now,
            },
        )
        .await;

    requests::created(result)
}

async fn list_my_project_assignments(State(state): State<AppState>, auth: AuthUser) -> Response {
    requests::list_mine(&state, &state.projects, &auth).await
}

async fn get_project_assignment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Response {
    requests::get_one(&state, &state.projects, &auth, id).await
}

async fn withdraw_project_assignment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Response {
    requests::withdraw(&state, &state.projects, &auth, id).await
}
