//! Approval flow configuration routes.
//!
//! Anyone signed in may read flows. Changing them is restricted to HR.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use hrflow_core::approval::{FlowStep, same_role};
use hrflow_db::repositories::{CreateFlowInput, UpdateFlowInput};
use hrflow_shared::AppError;

use crate::{
    AppState,
    error::{app_error_response, flow_error_response},
    middleware::AuthUser,
};

const FLOW_ADMIN_ROLE: &str = "HR";

/// Creates the approval flow routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/approval-flows", get(list_flows).post(create_flow))
        .route(
            "/approval-flows/{id}",
            get(get_flow).patch(update_flow).delete(delete_flow),
        )
}

// ============================================================================
// Request Types
// ============================================================================

/// Query parameters for listing flows.
#[derive(Debug, Deserialize)]
pub struct ListFlowsQuery {
    /// Only flows with this display name.
    pub display_name: Option<String>,
}

/// Request body for creating a flow.
#[derive(Debug, Deserialize)]
pub struct CreateFlowRequest {
    /// Request type key, e.g. `Leave`.
    pub request_type: String,
    /// Display name, e.g. `Leave Request`.
    pub display_name: String,
    /// Steps in approval order.
    pub steps: Vec<FlowStep>,
}

/// Request body for updating a flow.
#[derive(Debug, Deserialize)]
pub struct UpdateFlowRequest {
    /// New display name.
    pub display_name: Option<String>,
    /// Replacement steps.
    pub steps: Option<Vec<FlowStep>>,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/approval-flows` - List flows.
async fn list_flows(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<ListFlowsQuery>,
) -> Response {
    match state.flows.list(query.display_name.as_deref()).await {
        Ok(flows) => (StatusCode::OK, Json(json!({ "data": flows }))).into_response(),
        Err(e) => flow_error_response(e),
    }
}

/// GET `/approval-flows/{id}` - One flow.
async fn get_flow(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Response {
    match state.flows.find_by_id(id).await {
        Ok(Some(flow)) => (StatusCode::OK, Json(&*flow)).into_response(),
        Ok(None) => app_error_response(&AppError::NotFound(format!(
            "Approval flow {id} not found"
        ))),
        Err(e) => flow_error_response(e),
    }
}

/// POST `/approval-flows` - Create a flow.
async fn create_flow(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateFlowRequest>,
) -> Response {
    if let Err(response) = require_flow_admin(&auth) {
        return response;
    }

    let input = CreateFlowInput {
        request_type: payload.request_type.trim().to_string(),
        display_name: payload.display_name.trim().to_string(),
        steps: payload.steps,
    };

    match state.flows.create(input).await {
        Ok(flow) => {
            info!(
                flow_id = %flow.id,
                request_type = %flow.request_type,
                employee_id = auth.employee_id(),
                "Approval flow created"
            );
            (StatusCode::CREATED, Json(flow)).into_response()
        }
        Err(e) => flow_error_response(e),
    }
}

/// PATCH `/approval-flows/{id}` - Rename a flow or replace its steps.
///
/// Open requests keep their recorded trail entries; their remaining steps
/// resolve against the new definition.
async fn update_flow(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateFlowRequest>,
) -> Response {
    if let Err(response) = require_flow_admin(&auth) {
        return response;
    }

    let input = UpdateFlowInput {
        display_name: payload.display_name.map(|n| n.trim().to_string()),
        steps: payload.steps,
    };

    match state.flows.update(id, input).await {
        Ok(flow) => {
            info!(flow_id = %id, employee_id = auth.employee_id(), "Approval flow updated");
            (StatusCode::OK, Json(flow)).into_response()
        }
        Err(e) => flow_error_response(e),
    }
}

/// DELETE `/approval-flows/{id}` - Delete an unused flow.
async fn delete_flow(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Response {
    if let Err(response) = require_flow_admin(&auth) {
        return response;
    }

    match state.flows.delete(id).await {
        Ok(()) => {
            info!(flow_id = %id, employee_id = auth.employee_id(), "Approval flow deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => flow_error_response(e),
    }
}

fn require_flow_admin(auth: &AuthUser) -> Result<(), Response> {
    if same_role(auth.role(), FLOW_ADMIN_ROLE) {
        Ok(())
    } else {
        Err(app_error_response(&AppError::Forbidden(
            "Only HR may change approval flows".to_string(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::{bearer, body_json, json_request, router};
    use axum::http::StatusCode;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_only_hr_may_create_flows() {
        let auth = bearer("EMP0003", "Manager");
        let body = r#"{
            "request_type": "Leave",
            "display_name": "Leave Request",
            "steps": [
                {"role": "Employee", "sequence_no": 1},
                {"role": "Manager", "sequence_no": 2}
            ]
        }"#;

        let response = router()
            .oneshot(json_request(
                "POST",
                "/api/v1/approval-flows",
                Some(auth.as_str()),
                body,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(response).await["error"], "forbidden");
    }

    #[tokio::test]
    async fn test_only_hr_may_delete_flows() {
        let auth = bearer("EMP0001", "Employee");
        let response = router()
            .oneshot(json_request(
                "DELETE",
                "/api/v1/approval-flows/0192a0c0-0000-7000-8000-000000000001",
                Some(auth.as_str()),
                "",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
