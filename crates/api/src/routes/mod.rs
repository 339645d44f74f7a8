//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth_middleware};

pub mod approval_flows;
pub mod approvals;
pub mod health;
pub mod leaves;
pub mod projects;
pub mod requests;
pub mod tasks;

/// Creates the API router. Everything except health checks requires a
/// bearer token.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(approval_flows::routes())
        .merge(leaves::routes())
        .merge(projects::routes())
        .merge(tasks::routes())
        .merge(approvals::routes())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(health::routes())
        .merge(protected_routes)
}
