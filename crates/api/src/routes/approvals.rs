//! Approval decision, inbox and stepper routes.
//!
//! These routes work on every request kind; `{kind}` is one of `leave`,
//! `project` or `task` (plural forms are accepted too).

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use hrflow_core::approval::{ApprovalEntry, Decision, OverallStatus, RequestKind, Stepper};
use hrflow_db::repositories::ApprovalStore;

use super::requests::{RequestView, can_view, forbidden};
use crate::{
    AppState,
    error::{approval_error_response, error_response},
    middleware::AuthUser,
};

/// Creates the approval routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/approvals/pending", get(list_pending))
        .route("/approvals/{kind}/{id}/decision", post(decide))
        .route("/approvals/{kind}/{id}/stepper", get(get_stepper))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Body of a decision.
#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    /// `approve`/`approved` or `reject`/`rejected`.
    pub decision: String,
    /// Optional comments, shown to the applicant.
    pub comments: Option<String>,
}

/// Result of a decision.
#[derive(Debug, Serialize)]
pub struct DecisionResponse<R> {
    /// The request after the decision.
    pub request: RequestView<R>,
    /// The chain as resolved right after the decision.
    pub stepper: StepperResponse,
}

/// Resolved approval chain.
#[derive(Debug, Serialize)]
pub struct StepperResponse {
    /// Request identifier.
    pub request_id: Uuid,
    /// Request kind.
    pub kind: RequestKind,
    /// Structured overall status.
    pub overall_status: OverallStatus,
    /// Display form of the overall status.
    pub status: String,
    /// Applicant entry followed by one entry per resolved step.
    pub steps: Vec<ApprovalEntry>,
    /// Role of the first step nobody could be found for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truncated_at: Option<String>,
}

impl StepperResponse {
    fn new(kind: RequestKind, request_id: Uuid, stepper: Stepper) -> Self {
        let overall_status = stepper.overall_status();
        Self {
            request_id,
            kind,
            status: overall_status.to_string(),
            overall_status,
            steps: stepper.steps,
            truncated_at: stepper.truncated_at,
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/approvals/{kind}/{id}/decision` - Approve or reject as the caller.
async fn decide(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((kind, id)): Path<(String, Uuid)>,
    Json(payload): Json<DecisionRequest>,
) -> Response {
    let Some(kind) = RequestKind::parse(&kind) else {
        return unknown_kind(&kind);
    };
    let Some(decision) = Decision::parse(&payload.decision) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "invalid_decision",
            &format!(
                "Unknown decision '{}', expected approve or reject",
                payload.decision
            ),
        );
    };

    let comments = payload
        .comments
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    match kind {
        RequestKind::Leave => {
            decide_on(&state, &state.leaves, kind, id, &auth, decision, comments).await
        }
        RequestKind::Project => {
            decide_on(&state, &state.projects, kind, id, &auth, decision, comments).await
        }
        RequestKind::Task => {
            decide_on(&state, &state.tasks, kind, id, &auth, decision, comments).await
        }
    }
}

/// GET `/approvals/pending` - Requests waiting on the caller, by kind.
async fn list_pending(State(state): State<AppState>, auth: AuthUser) -> Response {
    let me = auth.employee_id();

    let leaves = match state.approvals.pending_for(&state.leaves, me).await {
        Ok(r) => r,
        Err(e) => return approval_error_response(e),
    };
    let projects = match state.approvals.pending_for(&state.projects, me).await {
        Ok(r) => r,
        Err(e) => return approval_error_response(e),
    };
    let tasks = match state.approvals.pending_for(&state.tasks, me).await {
        Ok(r) => r,
        Err(e) => return approval_error_response(e),
    };

    let leaves: Vec<_> = leaves.into_iter().map(RequestView::new).collect();
    let projects: Vec<_> = projects.into_iter().map(RequestView::new).collect();
    let tasks: Vec<_> = tasks.into_iter().map(RequestView::new).collect();

    (
        StatusCode::OK,
        Json(json!({
            "data": {
                "leaves": leaves,
                "projects": projects,
                "tasks": tasks,
            }
        })),
    )
        .into_response()
}

/// GET `/approvals/{kind}/{id}/stepper` - Replay the approval chain.
async fn get_stepper(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((kind, id)): Path<(String, Uuid)>,
) -> Response {
    let Some(kind) = RequestKind::parse(&kind) else {
        return unknown_kind(&kind);
    };

    match kind {
        RequestKind::Leave => stepper_of(&state, &state.leaves, kind, id, &auth).await,
        RequestKind::Project => stepper_of(&state, &state.projects, kind, id, &auth).await,
        RequestKind::Task => stepper_of(&state, &state.tasks, kind, id, &auth).await,
    }
}

// ============================================================================
// Helpers
// ============================================================================

async fn decide_on<S>(
    state: &AppState,
    store: &S,
    kind: RequestKind,
    id: Uuid,
    auth: &AuthUser,
    decision: Decision,
    comments: Option<String>,
) -> Response
where
    S: ApprovalStore,
    S::Request: Serialize,
{
    match state
        .approvals
        .decide(store, id, auth.employee_id(), decision, comments)
        .await
    {
        Ok(decided) => {
            let body = DecisionResponse {
                request: RequestView::new(decided.request),
                stepper: StepperResponse::new(kind, id, decided.outcome.stepper),
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => approval_error_response(e),
    }
}

async fn stepper_of<S: ApprovalStore>(
    state: &AppState,
    store: &S,
    kind: RequestKind,
    id: Uuid,
    auth: &AuthUser,
) -> Response {
    match state.approvals.stepper(store, id).await {
        Ok((request, stepper)) if can_view(&request, auth.employee_id()) => (
            StatusCode::OK,
            Json(StepperResponse::new(kind, id, stepper)),
        )
            .into_response(),
        Ok(_) => forbidden(),
        Err(e) => approval_error_response(e),
    }
}

fn unknown_kind(kind: &str) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        "unknown_request_kind",
        &format!("Unknown request kind '{kind}'"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{bearer, body_json, json_request, router};
    use tower::ServiceExt;

    const ID: &str = "0192a0c0-0000-7000-8000-000000000001";

    #[tokio::test]
    async fn test_unknown_kind_is_not_found() {
        let auth = bearer("EMP0002", "TeamLeader");
        let response = router()
            .oneshot(json_request(
                "POST",
                &format!("/api/v1/approvals/expenses/{ID}/decision"),
                Some(auth.as_str()),
                r#"{"decision": "approve"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "unknown_request_kind");
    }

    #[tokio::test]
    async fn test_unknown_decision_is_bad_request() {
        let auth = bearer("EMP0002", "TeamLeader");
        let response = router()
            .oneshot(json_request(
                "POST",
                &format!("/api/v1/approvals/leave/{ID}/decision"),
                Some(auth.as_str()),
                r#"{"decision": "maybe"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "invalid_decision");
    }

    #[tokio::test]
    async fn test_stepper_unknown_kind() {
        let auth = bearer("EMP0001", "Employee");
        let response = router()
            .oneshot(json_request(
                "GET",
                &format!("/api/v1/approvals/widgets/{ID}/stepper"),
                Some(auth.as_str()),
                "",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_stepper_response_shape() {
        let stepper = Stepper {
            steps: Vec::new(),
            truncated_at: Some("HR".into()),
        };
        let json = serde_json::to_value(StepperResponse::new(
            RequestKind::Leave,
            Uuid::nil(),
            stepper,
        ))
        .unwrap();

        assert_eq!(json["kind"], "leave");
        assert_eq!(json["status"], "Approved");
        assert_eq!(json["overall_status"]["state"], "approved");
        assert_eq!(json["truncated_at"], "HR");
    }
}
