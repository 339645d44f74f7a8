//! Leave request repository.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
    sea_query::Expr,
};
use uuid::Uuid;

use hrflow_core::requests::{LeaveRequest, LeaveType};

use crate::entities::leave_requests;
use crate::repositories::approval_store::{
    ApprovalColumns, ApprovalStore, pending_for, state_from_columns,
};

/// Leave request repository.
#[derive(Debug, Clone)]
pub struct LeaveRequestRepository {
    db: DatabaseConnection,
}

impl LeaveRequestRepository {
    /// Creates a new leave request repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ApprovalStore for LeaveRequestRepository {
    type Request = LeaveRequest;

    async fn insert(&self, request: &LeaveRequest) -> Result<(), DbErr> {
        let columns = ApprovalColumns::from_state(&request.approval)?;
        leave_requests::ActiveModel {
            id: Set(request.id.into_inner()),
            applicant_id: Set(request.applicant_id.clone()),
            flow_id: Set(request.flow_id),
            leave_type: Set(request.leave_type.as_str().to_string()),
            start_date: Set(request.start_date),
            end_date: Set(request.end_date),
            days: Set(request.days),
            reason: Set(request.reason.clone()),
            approval_trail: Set(columns.trail),
            overall_state: Set(columns.state),
            overall_role: Set(columns.role),
            version: Set(request.version),
            created_at: Set(request.created_at.into()),
            updated_at: Set(request.updated_at.into()),
        }
        .insert(&self.db)
        .await?;
        Ok(())
    }

    async fn load(&self, id: Uuid) -> Result<Option<LeaveRequest>, DbErr> {
        leave_requests::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(to_core)
            .transpose()
    }

    async fn save_approval(
        &self,
        request: &LeaveRequest,
        expected_version: i32,
    ) -> Result<bool, DbErr> {
        let columns = ApprovalColumns::from_state(&request.approval)?;
        let result = leave_requests::Entity::update_many()
            .col_expr(leave_requests::Column::ApprovalTrail, Expr::value(columns.trail))
            .col_expr(leave_requests::Column::OverallState, Expr::value(columns.state))
            .col_expr(leave_requests::Column::OverallRole, Expr::value(columns.role))
            .col_expr(leave_requests::Column::Version, Expr::value(expected_version + 1))
            .col_expr(
                leave_requests::Column::UpdatedAt,
                Expr::value(chrono::Utc::now()),
            )
            .filter(leave_requests::Column::Id.eq(request.id.into_inner()))
            .filter(leave_requests::Column::Version.eq(expected_version))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected == 1)
    }

    async fn delete(&self, id: Uuid, expected_version: i32) -> Result<bool, DbErr> {
        let result = leave_requests::Entity::delete_many()
            .filter(leave_requests::Column::Id.eq(id))
            .filter(leave_requests::Column::Version.eq(expected_version))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected == 1)
    }

    async fn list_by_applicant(&self, applicant_id: &str) -> Result<Vec<LeaveRequest>, DbErr> {
        leave_requests::Entity::find()
            .filter(leave_requests::Column::ApplicantId.eq(applicant_id))
            .order_by_desc(leave_requests::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(to_core)
            .collect()
    }

    async fn list_pending_for(&self, employee_id: &str) -> Result<Vec<LeaveRequest>, DbErr> {
        leave_requests::Entity::find()
            .filter(pending_for(
                leave_requests::Column::ApprovalTrail,
                employee_id,
            ))
            .order_by_asc(leave_requests::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(to_core)
            .collect()
    }
}

fn to_core(model: leave_requests::Model) -> Result<LeaveRequest, DbErr> {
    let leave_type = LeaveType::parse(&model.leave_type)
        .ok_or_else(|| DbErr::Custom(format!("unknown leave type: {}", model.leave_type)))?;
    let approval = state_from_columns(
        model.approval_trail,
        &model.overall_state,
        model.overall_role.as_deref(),
    )?;

    Ok(LeaveRequest {
        id: model.id.into(),
        applicant_id: model.applicant_id,
        flow_id: model.flow_id,
        leave_type,
        start_date: model.start_date,
        end_date: model.end_date,
        days: model.days,
        reason: model.reason,
        approval,
        version: model.version,
        created_at: model.created_at.into(),
        updated_at: model.updated_at.into(),
    })
}
