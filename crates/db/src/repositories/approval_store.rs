//! Storage capability shared by the three approvable request tables.
//!
//! Every request table carries the same approval columns: `approval_trail`
//! (JSONB array), `overall_state`, `overall_role` and `version`. Writes to
//! those columns are conditional on `version`, which is how concurrent
//! decisions on the same request are serialized.

use async_trait::async_trait;
use sea_orm::DbErr;
use sea_orm::sea_query::{Expr, IntoColumnRef, SimpleExpr, extension::postgres::PgBinOper};
use serde_json::json;
use uuid::Uuid;

use hrflow_core::approval::{Approvable, ApprovalState, ApprovalTrail, OverallStatus};

/// Persistence operations the approval workflow needs from a request table.
#[async_trait]
pub trait ApprovalStore: Send + Sync {
    /// The request type stored in this table.
    type Request: Approvable + Clone + Send + Sync;

    /// Inserts a freshly submitted request.
    async fn insert(&self, request: &Self::Request) -> Result<(), DbErr>;

    /// Loads a request by ID.
    async fn load(&self, id: Uuid) -> Result<Option<Self::Request>, DbErr>;

    /// Writes the request's approval state if the stored version still
    /// equals `expected_version`, bumping the version.
    ///
    /// Returns `false` when another writer got there first.
    async fn save_approval(
        &self,
        request: &Self::Request,
        expected_version: i32,
    ) -> Result<bool, DbErr>;

    /// Deletes a request if the stored version still equals
    /// `expected_version`.
    async fn delete(&self, id: Uuid, expected_version: i32) -> Result<bool, DbErr>;

    /// Requests filed by `applicant_id`, newest first.
    async fn list_by_applicant(&self, applicant_id: &str) -> Result<Vec<Self::Request>, DbErr>;

    /// Requests with an open pending slot for `employee_id`.
    async fn list_pending_for(&self, employee_id: &str) -> Result<Vec<Self::Request>, DbErr>;
}

/// Column values for an approval state.
pub(crate) struct ApprovalColumns {
    pub trail: serde_json::Value,
    pub state: String,
    pub role: Option<String>,
}

impl ApprovalColumns {
    pub(crate) fn from_state(state: &ApprovalState) -> Result<Self, DbErr> {
        let trail = serde_json::to_value(&state.trail)
            .map_err(|e| DbErr::Custom(format!("failed to encode approval trail: {e}")))?;
        Ok(Self {
            trail,
            state: state.overall_status.state().to_string(),
            role: state.overall_status.role().map(ToString::to_string),
        })
    }
}

/// Rebuilds an approval state from stored columns.
pub(crate) fn state_from_columns(
    trail: serde_json::Value,
    state: &str,
    role: Option<&str>,
) -> Result<ApprovalState, DbErr> {
    let trail: ApprovalTrail = serde_json::from_value(trail)
        .map_err(|e| DbErr::Custom(format!("malformed approval trail: {e}")))?;
    let overall_status = OverallStatus::from_parts(state, role)
        .ok_or_else(|| DbErr::Custom(format!("malformed overall status: {state}")))?;
    Ok(ApprovalState {
        trail,
        overall_status,
    })
}

/// JSONB containment pattern matching an open pending slot for an employee.
pub(crate) fn pending_pattern(employee_id: &str) -> serde_json::Value {
    json!([{ "employee_id": employee_id, "status": "pending" }])
}

/// `trail @> [{employee_id, status: pending}]` on a request table's trail
/// column. Served by the `jsonb_path_ops` GIN index.
pub(crate) fn pending_for<C: IntoColumnRef>(trail: C, employee_id: &str) -> SimpleExpr {
    Expr::col(trail).binary(PgBinOper::Contains, Expr::val(pending_pattern(employee_id)))
}
