//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST routes for flow configuration, request submission and decisions
//! - Bearer token authentication middleware
//! - The background notification dispatcher fed by approval events

pub mod error;
pub mod middleware;
pub mod notifications;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::http::header::AUTHORIZATION;
use sea_orm::DatabaseConnection;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::trace::TraceLayer;

use hrflow_core::approval::EventSink;
use hrflow_db::repositories::{
    ApprovalFlowRepository, ApprovalRepository, LeaveRequestRepository,
    ProjectAssignmentRepository, TaskAssignmentRepository,
};
use hrflow_shared::{ApprovalConfig, JwtService};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// JWT service for token validation.
    pub jwt_service: Arc<JwtService>,
    /// Flow configuration store. Shared with `approvals` so both see the
    /// same cache.
    pub flows: ApprovalFlowRepository,
    /// Approval workflow service.
    pub approvals: ApprovalRepository,
    /// Leave request table.
    pub leaves: LeaveRequestRepository,
    /// Project assignment table.
    pub projects: ProjectAssignmentRepository,
    /// Task assignment table.
    pub tasks: TaskAssignmentRepository,
}

impl AppState {
    /// Wires repositories around one connection pool.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        jwt_service: Arc<JwtService>,
        config: &ApprovalConfig,
        events: Arc<dyn EventSink>,
    ) -> Self {
        let flows = ApprovalFlowRepository::new(db.clone(), config.flow_cache_ttl_secs);
        let approvals = ApprovalRepository::new(
            db.clone(),
            flows.clone(),
            events,
            config.max_write_retries,
        );

        Self {
            jwt_service,
            flows,
            approvals,
            leaves: LeaveRequestRepository::new(db.clone()),
            projects: ProjectAssignmentRepository::new(db.clone()),
            tasks: TaskAssignmentRepository::new(db),
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(SetSensitiveRequestHeadersLayer::new(std::iter::once(
                    AUTHORIZATION,
                )))
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
