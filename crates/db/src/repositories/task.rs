//! Task assignment repository.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
    sea_query::Expr,
};
use uuid::Uuid;

use hrflow_core::requests::TaskAssignment;

use crate::entities::task_assignments;
use crate::repositories::approval_store::{
    ApprovalColumns, ApprovalStore, pending_for, state_from_columns,
};

/// Task assignment repository.
#[derive(Debug, Clone)]
pub struct TaskAssignmentRepository {
    db: DatabaseConnection,
}

impl TaskAssignmentRepository {
    /// Creates a new task assignment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ApprovalStore for TaskAssignmentRepository {
    type Request = TaskAssignment;

    async fn insert(&self, request: &TaskAssignment) -> Result<(), DbErr> {
        let columns = ApprovalColumns::from_state(&request.approval)?;
        task_assignments::ActiveModel {
            id: Set(request.id.into_inner()),
            applicant_id: Set(request.applicant_id.clone()),
            flow_id: Set(request.flow_id),
            title: Set(request.title.clone()),
            assignee_id: Set(request.assignee_id.clone()),
            project_id: Set(request.project_id),
            due_date: Set(request.due_date),
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

    async fn load(&self, id: Uuid) -> Result<Option<TaskAssignment>, DbErr> {
        task_assignments::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(to_core)
            .transpose()
    }

    async fn save_approval(
        &self,
        request: &TaskAssignment,
        expected_version: i32,
    ) -> Result<bool, DbErr> {
        let columns = ApprovalColumns::from_state(&request.approval)?;
        let result = task_assignments::Entity::update_many()
            .col_expr(task_assignments::Column::ApprovalTrail, Expr::value(columns.trail))
            .col_expr(task_assignments::Column::OverallState, Expr::value(columns.state))
            .col_expr(task_assignments::Column::OverallRole, Expr::value(columns.role))
            .col_expr(task_assignments::Column::Version, Expr::value(expected_version + 1))
            .col_expr(
                task_assignments::Column::UpdatedAt,
                Expr::value(chrono::Utc::now()),
            )
            .filter(task_assignments::Column::Id.eq(request.id.into_inner()))
            .filter(task_assignments::Column::Version.eq(expected_version))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected == 1)
    }

    async fn delete(&self, id: Uuid, expected_version: i32) -> Result<bool, DbErr> {
        let result = task_assignments::Entity::delete_many()
            .filter(task_assignments::Column::Id.eq(id))
            .filter(task_assignments::Column::Version.eq(expected_version))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected == 1)
    }

    async fn list_by_applicant(&self, applicant_id: &str) -> Result<Vec<TaskAssignment>, DbErr> {
        task_assignments::Entity::find()
            .filter(task_assignments::Column::ApplicantId.eq(applicant_id))
            .order_by_desc(task_assignments::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(to_core)
            .collect()
    }

    async fn list_pending_for(&self, employee_id: &str) -> Result<Vec<TaskAssignment>, DbErr> {
        task_assignments::Entity::find()
            .filter(pending_for(
                task_assignments::Column::ApprovalTrail,
                employee_id,
            ))
            .order_by_asc(task_assignments::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(to_core)
            .collect()
    }
}

fn to_core(model: task_assignments::Model) -> Result<TaskAssignment, DbErr> {
    let approval = state_from_columns(
        model.approval_trail,
        &model.overall_state,
        model.overall_role.as_deref(),
    )?;

    Ok(TaskAssignment {
        id: model.id.into(),
        applicant_id: model.applicant_id,
        flow_id: model.flow_id,
        title: model.title,
        assignee_id: model.assignee_id,
        project_id: model.project_id,
        due_date: model.due_date,
        approval,
        version: model.version,
        created_at: model.created_at.into(),
        updated_at: model.updated_at.into(),
    })
}
